//! Restaurant-scope endpoints

use reqwest::Method;
use serde::de::DeserializeOwned;

use super::{
    Area, ChangePassword, City, Country, Envelope, Id, ImageUpload, Order, OrderInput, Page,
    Permission, Restaurant, RestaurantInput, UploadedImage,
};
use crate::error::ApiError;
use crate::http::{ApiClient, ApiRequest, ScopedClient};

/// Restaurants, their orders and the location lookups used by their forms
#[derive(Clone, Copy)]
pub struct RestaurantApi<'a> {
    scoped: ScopedClient<'a>,
}

impl<'a> RestaurantApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            scoped: client.restaurant(),
        }
    }

    fn path(&self, rest: &str) -> String {
        format!(
            "/{}/{}",
            self.scoped.client().settings().restaurant_prefix.trim_matches('/'),
            rest
        )
    }

    fn orders_path(&self, restaurant_id: &str, rest: &str) -> String {
        self.path(&format!("{}/orders{}", urlencoding::encode(restaurant_id), rest))
    }

    async fn data<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let envelope: Envelope<T> = self.scoped.fetch(&request).await?;
        Ok(envelope.data)
    }

    /// `isPaginated=0` listing with optional filters
    async fn lookup<T: DeserializeOwned>(
        &self,
        resource: &str,
        filter: Option<(&str, Id)>,
    ) -> Result<Vec<T>, ApiError> {
        let mut builder = ApiRequest::builder(Method::GET, &self.path(resource)).param("isPaginated", 0);
        if let Some((field, value)) = filter {
            builder = builder.param(&format!("filter[{}]", field), value);
        }
        self.data(builder.build()?).await
    }

    pub async fn restaurants(&self, page: u64) -> Result<Page<Restaurant>, ApiError> {
        let request = ApiRequest::builder(Method::GET, &self.path("restaurants"))
            .param("page", page)
            .build()?;
        self.data(request).await
    }

    /// Every restaurant, for select inputs
    pub async fn all_restaurants(&self) -> Result<Vec<Restaurant>, ApiError> {
        self.lookup("restaurants", None).await
    }

    pub async fn create_restaurant(&self, input: &RestaurantInput) -> Result<Restaurant, ApiError> {
        let envelope: Envelope<Restaurant> = self.scoped.post(&self.path("restaurants"), input).await?;
        Ok(envelope.data)
    }

    pub async fn update_restaurant(
        &self,
        id: Id,
        input: &RestaurantInput,
    ) -> Result<Restaurant, ApiError> {
        let envelope: Envelope<Restaurant> = self
            .scoped
            .put(&self.path(&format!("restaurants/{}", id)), input)
            .await?;
        Ok(envelope.data)
    }

    pub async fn delete_restaurant(&self, id: Id) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .scoped
            .delete(&self.path(&format!("restaurants/{}", id)))
            .await?;
        Ok(())
    }

    pub async fn orders(&self, restaurant_id: &str, page: u64) -> Result<Page<Order>, ApiError> {
        let request = ApiRequest::builder(Method::GET, &self.orders_path(restaurant_id, ""))
            .param("page", page)
            .build()?;
        self.data(request).await
    }

    pub async fn order(&self, restaurant_id: &str, order_id: Id) -> Result<Order, ApiError> {
        let path = self.orders_path(restaurant_id, &format!("/{}", order_id));
        self.data(ApiRequest::get(&path)).await
    }

    pub async fn update_order(
        &self,
        restaurant_id: &str,
        order_id: Id,
        input: &OrderInput,
    ) -> Result<Order, ApiError> {
        let path = self.orders_path(restaurant_id, &format!("/{}", order_id));
        let envelope: Envelope<Order> = self.scoped.put(&path, input).await?;
        Ok(envelope.data)
    }

    pub async fn delete_order(&self, restaurant_id: &str, order_id: Id) -> Result<(), ApiError> {
        let path = self.orders_path(restaurant_id, &format!("/{}", order_id));
        let _: serde_json::Value = self.scoped.delete(&path).await?;
        Ok(())
    }

    pub async fn countries(&self) -> Result<Vec<Country>, ApiError> {
        self.lookup("countries", None).await
    }

    pub async fn cities(&self, country_id: Id) -> Result<Vec<City>, ApiError> {
        self.lookup("cities", Some(("country_id", country_id))).await
    }

    pub async fn areas(&self, city_id: Id) -> Result<Vec<Area>, ApiError> {
        self.lookup("areas", Some(("city_id", city_id))).await
    }

    pub async fn permissions(&self) -> Result<Vec<Permission>, ApiError> {
        self.lookup("permissions", None).await
    }

    pub async fn change_password(&self, input: &ChangePassword) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .scoped
            .put(&self.path("auth/change-password"), input)
            .await?;
        Ok(())
    }

    pub async fn upload_image(&self, image: ImageUpload) -> Result<UploadedImage, ApiError> {
        let request = ApiRequest::builder(Method::POST, &self.path("uploader/image"))
            .multipart(image.into_parts())
            .build()?;
        self.data(request).await
    }
}
