//! Admin-scope endpoints

use reqwest::Method;

use super::{
    Area, AreaInput, City, CityInput, Country, CountryInput, Driver, DriverInput, Envelope, Id,
    ImageUpload, Page, Permission, Profile, Role, RoleInput, UploadedImage,
};
use crate::error::ApiError;
use crate::http::{ApiClient, ApiRequest, FormPart, ScopedClient};

/// Countries, cities, areas, drivers, roles and permissions
#[derive(Clone, Copy)]
pub struct AdminApi<'a> {
    scoped: ScopedClient<'a>,
}

impl<'a> AdminApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            scoped: client.admin(),
        }
    }

    fn path(&self, rest: &str) -> String {
        format!("/{}/{}", self.scoped.client().settings().admin_prefix.trim_matches('/'), rest)
    }

    async fn list<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        page: u64,
        include: Option<&str>,
    ) -> Result<Page<T>, ApiError> {
        let mut builder = ApiRequest::builder(Method::GET, &self.path(resource)).param("page", page);
        if let Some(include) = include {
            builder = builder.param("include", include);
        }
        let envelope: Envelope<Page<T>> = self.scoped.fetch(&builder.build()?).await?;
        Ok(envelope.data)
    }

    async fn upsert<B, T>(&self, resource: &str, id: Option<Id>, body: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize,
        T: serde::de::DeserializeOwned,
    {
        let envelope: Envelope<T> = match id {
            None => self.scoped.post(&self.path(resource), body).await?,
            Some(id) => {
                self.scoped
                    .put(&self.path(&format!("{}/{}", resource, id)), body)
                    .await?
            }
        };
        Ok(envelope.data)
    }

    async fn remove(&self, resource: &str, id: Id) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .scoped
            .delete(&self.path(&format!("{}/{}", resource, id)))
            .await?;
        Ok(())
    }

    pub async fn profile(&self) -> Result<Profile, ApiError> {
        let envelope: Envelope<Profile> = self.scoped.get(&self.path("profile")).await?;
        Ok(envelope.data)
    }

    pub async fn countries(&self, page: u64) -> Result<Page<Country>, ApiError> {
        self.list("countries", page, None).await
    }

    /// Every country, for select inputs
    pub async fn all_countries(&self) -> Result<Vec<Country>, ApiError> {
        let request = ApiRequest::builder(Method::GET, &self.path("countries"))
            .param("isPaginated", 0)
            .build()?;
        let envelope: Envelope<Vec<Country>> = self.scoped.fetch(&request).await?;
        Ok(envelope.data)
    }

    pub async fn create_country(&self, input: &CountryInput) -> Result<Country, ApiError> {
        self.upsert("countries", None, input).await
    }

    pub async fn update_country(&self, id: Id, input: &CountryInput) -> Result<Country, ApiError> {
        self.upsert("countries", Some(id), input).await
    }

    pub async fn delete_country(&self, id: Id) -> Result<(), ApiError> {
        self.remove("countries", id).await
    }

    pub async fn cities(&self, page: u64) -> Result<Page<City>, ApiError> {
        self.list("cities", page, Some("country")).await
    }

    pub async fn create_city(&self, input: &CityInput) -> Result<City, ApiError> {
        self.upsert("cities", None, input).await
    }

    pub async fn update_city(&self, id: Id, input: &CityInput) -> Result<City, ApiError> {
        self.upsert("cities", Some(id), input).await
    }

    pub async fn delete_city(&self, id: Id) -> Result<(), ApiError> {
        self.remove("cities", id).await
    }

    pub async fn areas(&self, page: u64) -> Result<Page<Area>, ApiError> {
        self.list("areas", page, Some("city")).await
    }

    pub async fn create_area(&self, input: &AreaInput) -> Result<Area, ApiError> {
        self.upsert("areas", None, input).await
    }

    pub async fn update_area(&self, id: Id, input: &AreaInput) -> Result<Area, ApiError> {
        self.upsert("areas", Some(id), input).await
    }

    pub async fn delete_area(&self, id: Id) -> Result<(), ApiError> {
        self.remove("areas", id).await
    }

    pub async fn drivers(&self, page: u64) -> Result<Page<Driver>, ApiError> {
        self.list("drivers", page, Some("country,city,area")).await
    }

    pub async fn create_driver(&self, input: &DriverInput) -> Result<Driver, ApiError> {
        let request = ApiRequest::builder(Method::POST, &self.path("drivers"))
            .multipart(input.to_parts())
            .build()?;
        let envelope: Envelope<Driver> = self.scoped.fetch(&request).await?;
        Ok(envelope.data)
    }

    /// Multipart bodies can't be PUT to the backend, so the update is a POST
    /// carrying a `_method=PUT` override field.
    pub async fn update_driver(&self, id: Id, input: &DriverInput) -> Result<Driver, ApiError> {
        let mut parts = input.to_parts();
        parts.push(FormPart::text("_method", "PUT"));

        let request = ApiRequest::builder(Method::POST, &self.path(&format!("drivers/{}", id)))
            .multipart(parts)
            .build()?;
        let envelope: Envelope<Driver> = self.scoped.fetch(&request).await?;
        Ok(envelope.data)
    }

    pub async fn delete_driver(&self, id: Id) -> Result<(), ApiError> {
        self.remove("drivers", id).await
    }

    pub async fn roles(&self, page: u64) -> Result<Page<Role>, ApiError> {
        self.list("roles", page, Some("permissions")).await
    }

    pub async fn create_role(&self, input: &RoleInput) -> Result<Role, ApiError> {
        self.upsert("roles", None, input).await
    }

    pub async fn permissions(&self) -> Result<Vec<Permission>, ApiError> {
        let request = ApiRequest::builder(Method::GET, &self.path("permissions"))
            .param("isPaginated", 0)
            .build()?;
        let envelope: Envelope<Vec<Permission>> = self.scoped.fetch(&request).await?;
        Ok(envelope.data)
    }

    pub async fn upload_image(&self, image: ImageUpload) -> Result<UploadedImage, ApiError> {
        let request = ApiRequest::builder(Method::POST, &self.path("uploader/image"))
            .multipart(image.into_parts())
            .build()?;
        let envelope: Envelope<UploadedImage> = self.scoped.fetch(&request).await?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{json, FakeTransport};
    use crate::http::{Body, ClientSettings, PartValue};
    use crate::session::{Scope, Session, SessionContext};
    use serde_json::json as j;
    use std::sync::Arc;

    fn signed_in_client(transport: Arc<FakeTransport>) -> ApiClient {
        let client = ApiClient::new(transport, SessionContext::in_memory(), ClientSettings::default());
        client
            .session()
            .begin(Scope::Admin, &Session::new("A", Some("R".into())))
            .unwrap();
        client
    }

    #[tokio::test]
    async fn test_cities_page_includes_country() {
        let transport = Arc::new(FakeTransport::scripted(vec![json(
            200,
            j!({"data": {
                "items": [{"id": 1, "country_id": 2, "name_en": "Damascus", "name_ar": "دمشق", "name_tr": "Şam"}],
                "pagination": {"page": 3, "per_page": 10, "total": 31}
            }}),
        )]));
        let client = signed_in_client(transport.clone());

        let page = AdminApi::new(&client).cities(3).await.unwrap();

        assert_eq!(page.items[0].name_en, "Damascus");
        assert_eq!(page.total_pages(), 4);
        let call = &transport.calls()[0];
        assert_eq!(call.path, "/admin/cities");
        assert_eq!(
            call.params,
            vec![
                ("page".to_string(), "3".to_string()),
                ("include".to_string(), "country".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_update_country_puts_to_record() {
        let transport = Arc::new(FakeTransport::scripted(vec![json(
            200,
            j!({"data": {"id": 5, "name": "x", "currency": "TRY", "code": "TR"}}),
        )]));
        let client = signed_in_client(transport.clone());
        let input = CountryInput {
            name: "x".into(),
            currency: "TRY".into(),
            code: "TR".into(),
        };

        let country = AdminApi::new(&client).update_country(5, &input).await.unwrap();

        assert_eq!(country.id, 5);
        let call = &transport.calls()[0];
        assert_eq!(call.method, Method::PUT);
        assert_eq!(call.path, "/admin/countries/5");
        assert_eq!(call.body, Body::Json(j!({"name": "x", "currency": "TRY", "code": "TR"})));
    }

    #[tokio::test]
    async fn test_driver_update_is_resent_after_refresh() {
        let transport = Arc::new(FakeTransport::scripted(vec![
            json(401, j!({})),
            json(200, j!({"data": {"token": "NEW"}})),
            json(200, j!({"data": {
                "id": 8, "first_name": "Sami", "last_name": "K", "phone_number": "+90",
                "email": "s@example.com", "vehicle_type": "CAR", "status": "INACTIVE"
            }})),
        ]));
        let client = signed_in_client(transport.clone());
        let input = crate::resources::models::tests_support::driver_input();

        let driver = AdminApi::new(&client).update_driver(8, &input).await.unwrap();
        assert_eq!(driver.id, 8);

        let calls = transport.calls();
        assert_eq!(calls[0].method, Method::POST);
        assert_eq!(calls[0].path, "/admin/drivers/8");
        assert_eq!(calls[2].bearer.as_deref(), Some("NEW"));
        assert_eq!(calls[2].body, calls[0].body);
        match &calls[2].body {
            Body::Multipart(parts) => assert!(parts
                .iter()
                .any(|p| p.name == "_method" && p.value == PartValue::Text("PUT".into()))),
            other => panic!("expected multipart body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_image() {
        let transport = Arc::new(FakeTransport::scripted(vec![json(
            200,
            j!({"data": {"url": "https://cdn/x.png", "path": "images/x.png"}}),
        )]));
        let client = signed_in_client(transport.clone());

        let uploaded = AdminApi::new(&client)
            .upload_image(ImageUpload {
                file_name: "x.png".into(),
                content_type: Some("image/png".into()),
                bytes: vec![1, 2, 3],
                kind: "profile_image".into(),
            })
            .await
            .unwrap();

        assert_eq!(uploaded.url, "https://cdn/x.png");
        assert_eq!(transport.paths(), vec!["/admin/uploader/image"]);
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_response() {
        let transport = Arc::new(FakeTransport::scripted(vec![Ok(crate::http::ApiResponse::new(204, ""))]));
        let client = signed_in_client(transport.clone());

        AdminApi::new(&client).delete_area(12).await.unwrap();
        assert_eq!(transport.calls()[0].method, Method::DELETE);
        assert_eq!(transport.paths(), vec!["/admin/areas/12"]);
    }
}
