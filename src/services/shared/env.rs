use chrono::{Datelike, Utc};
use dotenvy::{dotenv, from_filename, var};

pub fn check_for_env_variables() {
    // the tax number is necessary for a valid filing header, thus the app
    // panics if it isn't present
    match get_env_variable("TAX_NUMBER") {
        Some(_) => println!("Tax number set ✅"),
        None => panic!("Please set your tax number as TAX_NUMBER in your environment variables"),
    };
    match get_env_variable("FILER_NAME") {
        Some(_) => println!("Filer name set ✅"),
        None => println!("No filer name set, the filing headers will carry an empty name. ⚠️"),
    };
    match get_env_variable("EMAIL") {
        Some(_) => println!("Contact email set ✅"),
        None => println!("No contact email set, it will be omitted from the filings. ⚠️"),
    };
}

pub fn get_env_variable(variable_to_get: &str) -> Option<String> {
    let environment = var("RUST_ENV").unwrap_or_else(|_| "development".into());

    match environment.as_str() {
        "development" => from_filename(".env.dev").ok(),
        "production" => from_filename(".env.prod").ok(),
        _ => dotenv().ok(),
    };
    var(variable_to_get).ok()
}

/// Identity block every filing envelope carries. Fields left empty are
/// omitted from the generated documents rather than emitted blank.
#[derive(Debug, Clone)]
pub struct FilerIdentity {
    pub tax_number: String,
    pub taxpayer_type: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub post_number: String,
    pub post_name: String,
    pub email: String,
    pub phone: String,
    pub resident_country: String,
    pub is_resident: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub tax_year: i32,
    pub filer: FilerIdentity,
}

pub fn load_config(year_override: Option<i32>) -> PipelineConfig {
    let tax_year = year_override
        .or_else(|| get_env_variable("TAX_YEAR").and_then(|year| year.parse().ok()))
        // most filings are prepared for the previous calendar year
        .unwrap_or_else(|| Utc::now().year() - 1);

    let env_or_empty = |name: &str| get_env_variable(name).unwrap_or_default();

    let filer = FilerIdentity {
        tax_number: env_or_empty("TAX_NUMBER"),
        taxpayer_type: get_env_variable("TAXPAYER_TYPE").unwrap_or_else(|| "FO".to_string()),
        name: env_or_empty("FILER_NAME"),
        address: env_or_empty("FILER_ADDRESS"),
        city: env_or_empty("FILER_CITY"),
        post_number: env_or_empty("FILER_POST_NUMBER"),
        post_name: env_or_empty("FILER_POST_NAME"),
        email: env_or_empty("EMAIL"),
        phone: env_or_empty("TELEPHONE_NUMBER"),
        resident_country: get_env_variable("RESIDENT_COUNTRY").unwrap_or_else(|| "SI".to_string()),
        is_resident: get_env_variable("IS_RESIDENT")
            .map(|value| value.to_lowercase() != "false")
            .unwrap_or(true),
    };

    PipelineConfig { tax_year, filer }
}

#[cfg(test)]
pub fn test_config(tax_year: i32) -> PipelineConfig {
    PipelineConfig {
        tax_year,
        filer: FilerIdentity {
            tax_number: "12345678".to_string(),
            taxpayer_type: "FO".to_string(),
            name: "Test Filer".to_string(),
            address: "Testna ulica 1".to_string(),
            city: "Ljubljana".to_string(),
            post_number: "1000".to_string(),
            post_name: "Ljubljana".to_string(),
            email: "filer@example.com".to_string(),
            phone: "+38640000000".to_string(),
            resident_country: "SI".to_string(),
            is_resident: true,
        },
    }
}
