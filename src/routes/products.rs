use crate::{
    error::AppError,
    models::{Product, ProductInput, ProductUpdate},
};
use actix_web::{delete, get, post, route, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, stock, featured, created_at, updated_at";

/// Retrieves all products.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Product` objects.
/// - `401 Unauthorized`: If the request lacks a valid bearer token.
#[get("")]
pub async fn list_products(pool: web::Data<PgPool>) -> Result<impl Responder, AppError> {
    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products ORDER BY id",
        PRODUCT_COLUMNS
    ))
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(products))
}

/// Creates a new product.
///
/// Required fields: `name`, `description`, `price` (>= 0, two decimal
/// places), `stock` (>= 1). `featured` is optional and defaults to false.
///
/// ## Responses:
/// - `201 Created`: The new `Product`.
/// - `422 Unprocessable Entity`: If validation fails.
#[post("")]
pub async fn create_product(
    pool: web::Data<PgPool>,
    product_data: web::Json<ProductInput>,
) -> Result<impl Responder, AppError> {
    product_data.validate()?;
    let input = product_data.into_inner();

    let product = sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO products (name, description, price, stock, featured)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {}",
        PRODUCT_COLUMNS
    ))
    .bind(input.name)
    .bind(input.description)
    .bind(input.price)
    .bind(input.stock)
    .bind(input.featured.unwrap_or(false))
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Created().json(product))
}

/// Retrieves a single product by id.
///
/// ## Responses:
/// - `200 OK`: The `Product`.
/// - `404 Not Found`: If no product with that id exists.
#[get("/{id}")]
pub async fn get_product(
    pool: web::Data<PgPool>,
    product_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products WHERE id = $1",
        PRODUCT_COLUMNS
    ))
    .bind(product_id.into_inner())
    .fetch_optional(&**pool)
    .await?;

    match product {
        Some(product) => Ok(HttpResponse::Ok().json(product)),
        None => Err(AppError::NotFound("Product Not Found".into())),
    }
}

/// Partially updates a product.
///
/// Only `name`, `description`, `price`, `stock`, and `featured` are
/// updatable; fields absent from the payload keep their current value.
/// Accepts both PUT and PATCH.
///
/// ## Responses:
/// - `200 OK`: The updated `Product`.
/// - `404 Not Found`: If no product with that id exists.
/// - `422 Unprocessable Entity`: If validation on the supplied fields fails.
#[route("/{id}", method = "PUT", method = "PATCH")]
pub async fn update_product(
    pool: web::Data<PgPool>,
    product_id: web::Path<i64>,
    product_data: web::Json<ProductUpdate>,
) -> Result<impl Responder, AppError> {
    product_data.validate()?;
    let update = product_data.into_inner();

    let product = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products
         SET name = COALESCE($1, name),
             description = COALESCE($2, description),
             price = COALESCE($3, price),
             stock = COALESCE($4, stock),
             featured = COALESCE($5, featured),
             updated_at = NOW()
         WHERE id = $6
         RETURNING {}",
        PRODUCT_COLUMNS
    ))
    .bind(update.name)
    .bind(update.description)
    .bind(update.price)
    .bind(update.stock)
    .bind(update.featured)
    .bind(product_id.into_inner())
    .fetch_optional(&**pool)
    .await?;

    match product {
        Some(product) => Ok(HttpResponse::Ok().json(product)),
        None => Err(AppError::NotFound("Product Not Found".into())),
    }
}

/// Deletes a product by id.
///
/// ## Responses:
/// - `204 No Content`: On successful deletion.
/// - `404 Not Found`: If no product with that id exists.
#[delete("/{id}")]
pub async fn delete_product(
    pool: web::Data<PgPool>,
    product_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(product_id.into_inner())
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Product Not Found".into()));
    }

    Ok(HttpResponse::NoContent().finish())
}
