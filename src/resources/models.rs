//! Domain records and create/update payloads

use serde::{Deserialize, Serialize};

use super::flex;
use crate::http::FormPart;

pub type Id = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    #[serde(deserialize_with = "flex::number")]
    pub id: Id,
    pub name: String,
    pub currency: String,
    pub code: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryInput {
    pub name: String,
    pub currency: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(deserialize_with = "flex::number")]
    pub id: Id,
    #[serde(deserialize_with = "flex::number")]
    pub country_id: Id,
    pub name_en: String,
    pub name_ar: String,
    pub name_tr: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub country: Option<Country>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityInput {
    pub name_en: String,
    pub name_ar: String,
    pub name_tr: String,
    pub country_id: Id,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    #[serde(deserialize_with = "flex::number")]
    pub id: Id,
    #[serde(deserialize_with = "flex::number")]
    pub city_id: Id,
    pub name_en: String,
    pub name_ar: String,
    pub name_tr: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub city: Option<City>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaInput {
    pub name_en: String,
    pub name_ar: String,
    pub name_tr: String,
    pub city_id: Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VehicleType {
    Car,
    Motorcycle,
    Bicycle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DriverStatus {
    Active,
    Inactive,
}

impl VehicleType {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleType::Car => "CAR",
            VehicleType::Motorcycle => "MOTORCYCLE",
            VehicleType::Bicycle => "BICYCLE",
        }
    }
}

impl DriverStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DriverStatus::Active => "ACTIVE",
            DriverStatus::Inactive => "INACTIVE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    #[serde(deserialize_with = "flex::number")]
    pub id: Id,
    #[serde(default, deserialize_with = "flex::opt_number")]
    pub country_id: Option<Id>,
    #[serde(default, deserialize_with = "flex::opt_number")]
    pub city_id: Option<Id>,
    #[serde(default, deserialize_with = "flex::opt_number")]
    pub area_id: Option<Id>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    pub phone_number: String,
    pub email: String,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub national_id: Option<String>,
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub plate_number: Option<String>,
    #[serde(default, deserialize_with = "flex::flag")]
    pub has_driving_license: bool,
    #[serde(default, deserialize_with = "flex::flag")]
    pub has_worked_before: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub vehicle_image: Option<String>,
    #[serde(default, deserialize_with = "flex::opt_decimal")]
    pub max_capacity: Option<f64>,
    #[serde(default, deserialize_with = "flex::opt_decimal")]
    pub vehicle_max_distance: Option<f64>,
    pub status: DriverStatus,
    #[serde(default, deserialize_with = "flex::flag")]
    pub is_available: bool,
    #[serde(default)]
    pub starting_work_at: Option<String>,
    #[serde(default)]
    pub finishing_work_at: Option<String>,
    #[serde(default, deserialize_with = "flex::flag")]
    pub is_application_locked: bool,
    #[serde(default)]
    pub country: Option<Country>,
    #[serde(default)]
    pub city: Option<City>,
    #[serde(default)]
    pub area: Option<Area>,
}

impl Driver {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Driver create/update form, sent as multipart
#[derive(Debug, Clone, PartialEq)]
pub struct DriverInput {
    pub country_id: Id,
    pub city_id: Id,
    pub area_id: Id,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub phone_number: String,
    pub email: String,
    pub nationality: String,
    pub national_id: String,
    pub vehicle_type: VehicleType,
    pub plate_number: String,
    pub has_driving_license: bool,
    pub has_worked_before: bool,
    pub notes: Option<String>,
    /// URL returned by a previous image upload
    pub profile_image: Option<String>,
    pub vehicle_image: Option<String>,
    pub max_capacity: f64,
    pub vehicle_max_distance: f64,
    pub status: DriverStatus,
    pub is_available: bool,
    pub starting_work_at: String,
    pub finishing_work_at: String,
    pub is_application_locked: bool,
    /// Required on create, omitted on update when unchanged
    pub password: Option<String>,
}

impl DriverInput {
    pub(crate) fn to_parts(&self) -> Vec<FormPart> {
        let flag = |value: bool| if value { "1" } else { "0" };

        let mut parts = vec![
            FormPart::text("first_name", &self.first_name),
            FormPart::text("last_name", &self.last_name),
            FormPart::text("date_of_birth", &self.date_of_birth),
            FormPart::text("phone_number", &self.phone_number),
            FormPart::text("email", &self.email),
            FormPart::text("nationality", &self.nationality),
            FormPart::text("national_id", &self.national_id),
            FormPart::text("vehicle_type", self.vehicle_type.as_str()),
            FormPart::text("plate_number", &self.plate_number),
            FormPart::text("notes", self.notes.as_deref().unwrap_or_default()),
            FormPart::text("max_capacity", self.max_capacity.to_string()),
            FormPart::text("vehicle_max_distance", self.vehicle_max_distance.to_string()),
            FormPart::text("status", self.status.as_str()),
            FormPart::text("starting_work_at", &self.starting_work_at),
            FormPart::text("finishing_work_at", &self.finishing_work_at),
            FormPart::text("country_id", self.country_id.to_string()),
            FormPart::text("city_id", self.city_id.to_string()),
            FormPart::text("area_id", self.area_id.to_string()),
            FormPart::text("has_driving_license", flag(self.has_driving_license)),
            FormPart::text("has_worked_before", flag(self.has_worked_before)),
            FormPart::text("is_available", flag(self.is_available)),
            FormPart::text("is_application_locked", flag(self.is_application_locked)),
        ];
        if let Some(url) = &self.profile_image {
            parts.push(FormPart::text("profile_image", url));
        }
        if let Some(url) = &self.vehicle_image {
            parts.push(FormPart::text("vehicle_image", url));
        }
        if let Some(password) = &self.password {
            parts.push(FormPart::text("password", password));
            parts.push(FormPart::text("password_confirmation", password));
        }
        parts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(deserialize_with = "flex::number")]
    pub id: Id,
    #[serde(deserialize_with = "flex::number")]
    pub restaurant_id: Id,
    #[serde(default, deserialize_with = "flex::opt_decimal")]
    pub pickup_latitude: Option<f64>,
    #[serde(default, deserialize_with = "flex::opt_decimal")]
    pub pickup_longitude: Option<f64>,
    #[serde(default, deserialize_with = "flex::opt_decimal")]
    pub delivery_latitude: Option<f64>,
    #[serde(default, deserialize_with = "flex::opt_decimal")]
    pub delivery_longitude: Option<f64>,
    #[serde(default, deserialize_with = "flex::opt_decimal")]
    pub price: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderInput {
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub delivery_latitude: f64,
    pub delivery_longitude: f64,
    pub price: f64,
    pub notes: String,
    pub customer_phone: String,
}

/// Restaurant logo: an uploaded file reference or a bare URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Logo {
    Uploaded { path: String, url: String },
    Url(String),
}

impl Logo {
    pub fn url(&self) -> &str {
        match self {
            Logo::Uploaded { url, .. } => url,
            Logo::Url(url) => url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    #[serde(deserialize_with = "flex::number")]
    pub id: Id,
    #[serde(default, deserialize_with = "flex::opt_number")]
    pub country_id: Option<Id>,
    #[serde(default, deserialize_with = "flex::opt_number")]
    pub city_id: Option<Id>,
    #[serde(default, deserialize_with = "flex::opt_number")]
    pub area_id: Option<Id>,
    pub name_en: String,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub name_tr: Option<String>,
    #[serde(default)]
    pub address_en: Option<String>,
    #[serde(default)]
    pub address_ar: Option<String>,
    #[serde(default)]
    pub address_tr: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub logo: Option<Logo>,
    #[serde(default, deserialize_with = "flex::opt_decimal")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "flex::opt_decimal")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub facebook_url: Option<String>,
    #[serde(default)]
    pub instagram_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default, deserialize_with = "flex::flag")]
    pub is_available: bool,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantInput {
    pub country_id: Id,
    pub city_id: Id,
    pub area_id: Id,
    pub name_en: String,
    pub name_ar: String,
    pub name_tr: String,
    pub address_en: String,
    pub address_ar: String,
    pub address_tr: String,
    pub email: String,
    pub phone: String,
    pub contact_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub latitude: String,
    pub longitude: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram_url: Option<String>,
    pub is_available: bool,
    pub start_time: String,
    pub end_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(deserialize_with = "flex::number")]
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub guard: Option<String>,
}

/// Role permissions come back as names or as full records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RolePermission {
    Record(Permission),
    Name(String),
}

impl RolePermission {
    pub fn name(&self) -> &str {
        match self {
            RolePermission::Record(p) => &p.name,
            RolePermission::Name(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(deserialize_with = "flex::number")]
    pub id: Id,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub name_tr: Option<String>,
    #[serde(default)]
    pub permissions: Vec<RolePermission>,
    #[serde(default)]
    pub guard: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInput {
    pub name_en: String,
    pub name_ar: String,
    pub name_tr: String,
    /// Permission names
    pub permissions: Vec<String>,
}

/// Signed-in admin as returned by the profile endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(deserialize_with = "flex::number")]
    pub id: Id,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<RolePermission>,
    #[serde(default)]
    pub permissions: Vec<RolePermission>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePassword {
    pub old_password: String,
    pub new_password: String,
    pub new_password_confirmation: String,
}

impl ChangePassword {
    pub fn new(old_password: impl Into<String>, new_password: impl Into<String>) -> Self {
        let new_password = new_password.into();
        Self {
            old_password: old_password.into(),
            new_password_confirmation: new_password.clone(),
            new_password,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_with_string_foreign_key() {
        let city: City = serde_json::from_str(
            r#"{"id":4,"country_id":"2","name_en":"Aleppo","name_ar":"حلب","name_tr":"Halep",
                "country":{"id":2,"name":"Syria","currency":"SYP","code":"SY"}}"#,
        )
        .unwrap();
        assert_eq!(city.country_id, 2);
        assert_eq!(city.country.unwrap().name, "Syria");
    }

    #[test]
    fn test_driver_flags_and_enums() {
        let driver: Driver = serde_json::from_str(
            r#"{"id":9,"country_id":1,"city_id":"2","area_id":3,"first_name":"Sami","last_name":"K",
                "phone_number":"+90","email":"s@example.com","vehicle_type":"MOTORCYCLE",
                "has_driving_license":1,"has_worked_before":0,"max_capacity":"20",
                "status":"ACTIVE","is_available":"1","is_application_locked":0,"profile_image":null}"#,
        )
        .unwrap();
        assert_eq!(driver.vehicle_type, VehicleType::Motorcycle);
        assert!(driver.has_driving_license);
        assert!(!driver.has_worked_before);
        assert!(driver.is_available);
        assert_eq!(driver.max_capacity, Some(20.0));
        assert_eq!(driver.full_name(), "Sami K");
    }

    #[test]
    fn test_restaurant_logo_shapes() {
        let object: Logo = serde_json::from_str(r#"{"path":"logos/a.png","url":"https://cdn/a.png"}"#).unwrap();
        let bare: Logo = serde_json::from_str(r#""https://cdn/b.png""#).unwrap();
        assert_eq!(object.url(), "https://cdn/a.png");
        assert_eq!(bare.url(), "https://cdn/b.png");
    }

    #[test]
    fn test_role_permissions_either_shape() {
        let role: Role = serde_json::from_str(
            r#"{"id":1,"name_en":"Ops","permissions":["orders.view",{"id":3,"name":"orders.edit","guard":"admin"}]}"#,
        )
        .unwrap();
        let names: Vec<&str> = role.permissions.iter().map(RolePermission::name).collect();
        assert_eq!(names, vec!["orders.view", "orders.edit"]);
    }

    #[test]
    fn test_driver_form_parts() {
        let input = tests_support::driver_input();

        let parts = input.to_parts();
        let find = |name: &str| parts.iter().find(|p| p.name == name).map(|p| p.value.clone());

        use crate::http::PartValue;
        assert_eq!(find("vehicle_type"), Some(PartValue::Text("CAR".into())));
        assert_eq!(find("has_driving_license"), Some(PartValue::Text("1".into())));
        assert_eq!(find("has_worked_before"), Some(PartValue::Text("0".into())));
        assert_eq!(find("vehicle_max_distance"), Some(PartValue::Text("15.5".into())));
        assert_eq!(find("password_confirmation"), Some(PartValue::Text("secret123".into())));
        assert_eq!(find("vehicle_image"), None);
    }

    #[test]
    fn test_change_password_confirms() {
        let body = serde_json::to_value(ChangePassword::new("old-pass", "new-pass")).unwrap();
        assert_eq!(body["new_password_confirmation"], "new-pass");
    }
}
