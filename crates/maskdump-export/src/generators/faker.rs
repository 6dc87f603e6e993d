use fake::Fake;
use fake::faker::address::en::{CityName, CountryName, StreetName, ZipCode};
use fake::faker::company::en::CompanyName;
use fake::faker::creditcard::en::CreditCardNumber;
use fake::faker::internet::en::{FreeEmail, IPv4, SafeEmail, Username};
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use rand::RngCore;
use serde_json::Value;

use crate::generators::{Generator, GeneratorRegistry};

#[derive(Clone, Copy, Debug)]
enum FakerKind {
    Name,
    FirstName,
    LastName,
    SafeEmail,
    FreeEmail,
    Username,
    Ipv4,
    PhoneNumber,
    CompanyName,
    StreetName,
    CityName,
    ZipCode,
    CountryName,
    Sentence,
    Word,
    CreditCardNumber,
    UuidV4,
}

const FAKER_IDS: &[(&str, FakerKind)] = &[
    ("address.city_name", FakerKind::CityName),
    ("address.country_name", FakerKind::CountryName),
    ("address.street_name", FakerKind::StreetName),
    ("address.zip_code", FakerKind::ZipCode),
    ("company.company_name", FakerKind::CompanyName),
    ("creditcard.number", FakerKind::CreditCardNumber),
    ("internet.free_email", FakerKind::FreeEmail),
    ("internet.ipv4", FakerKind::Ipv4),
    ("internet.safe_email", FakerKind::SafeEmail),
    ("internet.username", FakerKind::Username),
    ("lorem.sentence", FakerKind::Sentence),
    ("lorem.word", FakerKind::Word),
    ("name.first_name", FakerKind::FirstName),
    ("name.last_name", FakerKind::LastName),
    ("name.name", FakerKind::Name),
    ("phone_number.phone_number", FakerKind::PhoneNumber),
    ("uuid.v4", FakerKind::UuidV4),
];

pub fn register(registry: &mut GeneratorRegistry) {
    for &(id, kind) in FAKER_IDS {
        registry.register_generator(Box::new(FakerGenerator { id, kind }));
    }
}

struct FakerGenerator {
    id: &'static str,
    kind: FakerKind,
}

impl Generator for FakerGenerator {
    fn id(&self) -> &'static str {
        self.id
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Value {
        let text: String = match self.kind {
            FakerKind::Name => Name().fake_with_rng(rng),
            FakerKind::FirstName => FirstName().fake_with_rng(rng),
            FakerKind::LastName => LastName().fake_with_rng(rng),
            FakerKind::SafeEmail => SafeEmail().fake_with_rng(rng),
            FakerKind::FreeEmail => FreeEmail().fake_with_rng(rng),
            FakerKind::Username => Username().fake_with_rng(rng),
            FakerKind::Ipv4 => IPv4().fake_with_rng(rng),
            FakerKind::PhoneNumber => PhoneNumber().fake_with_rng(rng),
            FakerKind::CompanyName => CompanyName().fake_with_rng(rng),
            FakerKind::StreetName => StreetName().fake_with_rng(rng),
            FakerKind::CityName => CityName().fake_with_rng(rng),
            FakerKind::ZipCode => ZipCode().fake_with_rng(rng),
            FakerKind::CountryName => CountryName().fake_with_rng(rng),
            FakerKind::Sentence => Sentence(3..8).fake_with_rng(rng),
            FakerKind::Word => Word().fake_with_rng(rng),
            FakerKind::CreditCardNumber => CreditCardNumber().fake_with_rng(rng),
            FakerKind::UuidV4 => {
                let mut bytes = [0u8; 16];
                rng.fill_bytes(&mut bytes);
                uuid::Builder::from_random_bytes(bytes)
                    .into_uuid()
                    .to_string()
            }
        };
        Value::String(text)
    }
}
