//! Header detection for uploaded claim spreadsheets.
//!
//! Exports from other tools name their columns every which way ("Zip",
//! "Postal Code", "ZIP/Postal"). Headers are reduced to lower-case
//! alphanumerics and matched against alias lists.

use serde::Serialize;

const NAME: &[&str] = &["name", "fullname", "recipient", "recipientname", "contactname"];
const FIRST_NAME: &[&str] = &["firstname", "first", "givenname", "fname"];
const LAST_NAME: &[&str] = &["lastname", "last", "surname", "familyname", "lname"];
const EMAIL: &[&str] = &["email", "emailaddress", "mail", "eaddress"];
const PHONE: &[&str] = &["phone", "phonenumber", "mobile", "cell", "telephone", "tel"];
const ADDRESS1: &[&str] = &[
    "address1",
    "addressline1",
    "street",
    "streetaddress",
    "address1street",
    "line1",
];
const FULL_ADDRESS: &[&str] = &["address", "shippingaddress", "mailingaddress"];
const ADDRESS2: &[&str] = &[
    "address2",
    "addressline2",
    "apt",
    "apartment",
    "suite",
    "unit",
    "line2",
];
const CITY: &[&str] = &["city", "town", "locality"];
const REGION: &[&str] = &["state", "region", "province", "stateprovince", "county"];
const POSTAL: &[&str] = &["zip", "zipcode", "postalcode", "postcode", "postal", "zippostal"];
const COUNTRY: &[&str] = &["country", "countrycode", "nation"];
const STATUS: &[&str] = &["status", "claimstatus"];
const NOTES: &[&str] = &["notes", "note", "adminnotes", "comments", "comment"];

/// Lower-case and drop everything that is not a letter or digit
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Column index for each field we know how to read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    pub name: Option<usize>,
    pub first_name: Option<usize>,
    pub last_name: Option<usize>,
    pub email: Option<usize>,
    pub phone: Option<usize>,
    pub address_line1: Option<usize>,
    pub address_line2: Option<usize>,
    pub city: Option<usize>,
    pub region: Option<usize>,
    pub postal_code: Option<usize>,
    pub country: Option<usize>,
    pub status: Option<usize>,
    pub notes: Option<usize>,
}

impl ColumnMapping {
    /// Match headers against the alias lists. The first matching column wins.
    pub fn detect<S: AsRef<str>>(headers: &[S]) -> Self {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| normalize_header(h.as_ref()))
            .collect();
        let find = |aliases: &[&str]| normalized.iter().position(|h| aliases.contains(&h.as_str()));

        Self {
            name: find(NAME),
            first_name: find(FIRST_NAME),
            last_name: find(LAST_NAME),
            email: find(EMAIL),
            phone: find(PHONE),
            // A single "Address" column stands in for line 1
            address_line1: find(ADDRESS1).or_else(|| find(FULL_ADDRESS)),
            address_line2: find(ADDRESS2),
            city: find(CITY),
            region: find(REGION),
            postal_code: find(POSTAL),
            country: find(COUNTRY),
            status: find(STATUS),
            notes: find(NOTES),
        }
    }

    pub fn has_name(&self) -> bool {
        self.name.is_some() || self.first_name.is_some() || self.last_name.is_some()
    }

    /// Required fields that no header matched
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.has_name() {
            missing.push("name");
        }
        if self.address_line1.is_none() {
            missing.push("address_line1");
        }
        missing
    }
}
