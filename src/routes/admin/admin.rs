use crate::db::PgPool;
use crate::db_models::{EmploymentRecord, NewRestaurant, Restaurant, UserProfile};
use crate::domain::{EmploymentStatus, Role, StaffRole};
use crate::errors::custom::CustomError;
use crate::middleware::AuthenticatedUser;
use crate::routes::access::ensure_restaurant_exists;
use crate::schema::{employment_records, restaurants, users};
use crate::validations::name_email::{PersonName, PhoneNumber};
use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct RestaurantBody {
    name: String,
    description: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    town_city: Option<String>,
}

pub struct ValidRestaurant {
    name: PersonName,
    description: Option<String>,
    phone: Option<PhoneNumber>,
    address: Option<String>,
    town_city: Option<String>,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl RestaurantBody {
    pub fn validate(self) -> Result<ValidRestaurant, String> {
        Ok(ValidRestaurant {
            name: PersonName::parse(self.name)?,
            description: non_blank(self.description),
            phone: PhoneNumber::parse_optional(self.phone)?,
            address: non_blank(self.address),
            town_city: non_blank(self.town_city),
        })
    }
}

#[derive(Deserialize)]
pub struct UpdateRoleBody {
    pub role: Role,
}

#[derive(Deserialize)]
pub struct ActiveBody {
    pub is_active: bool,
}

#[derive(Deserialize)]
pub struct AppointManagerBody {
    pub user_id: Uuid,
}

/******************************************/
// Listing Users
/******************************************/
/**
 * @route   GET /api/admin/users
 * @access  JWT Protected, admin
 */
#[instrument(name = "List users", skip(pool, user), fields(user_id = %user.id))]
pub async fn list_users(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    user.require_role(&[Role::Admin])?;
    let mut conn = pool.get().await?;
    let rows = users::table
        .order(users::created_at.desc())
        .select(UserProfile::as_select())
        .load(&mut conn)
        .await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "users": rows})))
}

/******************************************/
// Changing a User Role
/******************************************/
/**
 * @route   PUT /api/admin/users/{id}/role
 * @access  JWT Protected, admin
 */
#[instrument(name = "Update user role", skip(pool, req_role, user), fields(user_id = %user.id, role = %req_role.role))]
pub async fn update_role(
    pool: web::Data<PgPool>,
    target_id: web::Path<Uuid>,
    req_role: web::Json<UpdateRoleBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    user.require_role(&[Role::Admin])?;
    let target_id = target_id.into_inner();
    if target_id == user.id && req_role.role != Role::Admin {
        return Err(CustomError::Conflict(
            "Admins cannot demote themselves".to_string(),
        ));
    }
    let mut conn = pool.get().await?;
    let profile = diesel::update(users::table.find(target_id))
        .set(users::role.eq(req_role.role))
        .returning(UserProfile::as_returning())
        .get_result(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| CustomError::NotFound("User not found".to_string()))?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "user": profile})))
}

/******************************************/
// Listing All Restaurants
/******************************************/
/**
 * @route   GET /api/admin/restaurants
 * @access  JWT Protected, admin
 */
#[instrument(name = "List all restaurants", skip(pool, user), fields(user_id = %user.id))]
pub async fn list_all_restaurants(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    user.require_role(&[Role::Admin])?;
    let mut conn = pool.get().await?;
    let rows = restaurants::table
        .order(restaurants::created_at.desc())
        .select(Restaurant::as_select())
        .load(&mut conn)
        .await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "restaurants": rows})))
}

/******************************************/
// Creating a Restaurant
/******************************************/
/**
 * @route   POST /api/admin/restaurants
 * @access  JWT Protected, admin
 */
#[instrument(name = "Create restaurant", skip(pool, req_restaurant, user), fields(user_id = %user.id))]
pub async fn create_restaurant(
    pool: web::Data<PgPool>,
    req_restaurant: web::Json<RestaurantBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    user.require_role(&[Role::Admin])?;
    let data = req_restaurant
        .into_inner()
        .validate()
        .map_err(CustomError::ValidationError)?;
    let phone: Option<&str> = data.phone.as_ref().map(|p| p.as_ref());
    let mut conn = pool.get().await?;
    let restaurant = diesel::insert_into(restaurants::table)
        .values(&NewRestaurant {
            id: Uuid::new_v4(),
            name: data.name.as_ref(),
            description: data.description.as_deref(),
            phone,
            address: data.address.as_deref(),
            town_city: data.town_city.as_deref(),
            is_active: true,
        })
        .returning(Restaurant::as_returning())
        .get_result(&mut conn)
        .await?;
    tracing::info!(restaurant_id = %restaurant.id, "Restaurant created");
    Ok(HttpResponse::Created().json(json!({"success": true, "restaurant": restaurant})))
}

/******************************************/
// Updating a Restaurant
/******************************************/
/**
 * @route   PUT /api/admin/restaurants/{id}
 * @access  JWT Protected, admin
 */
#[instrument(name = "Update restaurant", skip(pool, req_restaurant, user), fields(user_id = %user.id))]
pub async fn update_restaurant(
    pool: web::Data<PgPool>,
    restaurant_id: web::Path<Uuid>,
    req_restaurant: web::Json<RestaurantBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    user.require_role(&[Role::Admin])?;
    let data = req_restaurant
        .into_inner()
        .validate()
        .map_err(CustomError::ValidationError)?;
    let phone: Option<&str> = data.phone.as_ref().map(|p| p.as_ref());
    let mut conn = pool.get().await?;
    let restaurant = diesel::update(restaurants::table.find(restaurant_id.into_inner()))
        .set((
            restaurants::name.eq(data.name.as_ref()),
            restaurants::description.eq(data.description.as_deref()),
            restaurants::phone.eq(phone),
            restaurants::address.eq(data.address.as_deref()),
            restaurants::town_city.eq(data.town_city.as_deref()),
        ))
        .returning(Restaurant::as_returning())
        .get_result(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| CustomError::NotFound("Restaurant not found".to_string()))?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "restaurant": restaurant})))
}

/******************************************/
// Activating / Deactivating a Restaurant
/******************************************/
/**
 * @route   PUT /api/admin/restaurants/{id}/active
 * @access  JWT Protected, admin
 */
#[instrument(name = "Set restaurant active flag", skip(pool, req_body, user), fields(user_id = %user.id, is_active = req_body.is_active))]
pub async fn set_restaurant_active(
    pool: web::Data<PgPool>,
    restaurant_id: web::Path<Uuid>,
    req_body: web::Json<ActiveBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    user.require_role(&[Role::Admin])?;
    let mut conn = pool.get().await?;
    let restaurant = diesel::update(restaurants::table.find(restaurant_id.into_inner()))
        .set(restaurants::is_active.eq(req_body.is_active))
        .returning(Restaurant::as_returning())
        .get_result(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| CustomError::NotFound("Restaurant not found".to_string()))?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "restaurant": restaurant})))
}

/******************************************/
// Appointing a Restaurant Manager
/******************************************/
/**
 * @route   POST /api/admin/restaurants/{id}/managers
 * @access  JWT Protected, admin
 */
#[instrument(name = "Appoint manager", skip(pool, req_body, user), fields(user_id = %user.id, manager_id = %req_body.user_id))]
pub async fn appoint_manager(
    pool: web::Data<PgPool>,
    restaurant_id: web::Path<Uuid>,
    req_body: web::Json<AppointManagerBody>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, CustomError> {
    user.require_role(&[Role::Admin])?;
    let restaurant_id = restaurant_id.into_inner();
    let manager_id = req_body.user_id;
    let mut conn = pool.get().await?;
    ensure_restaurant_exists(&mut conn, restaurant_id).await?;

    let record = conn
        .transaction::<_, CustomError, _>(|conn| {
            async move {
                let target_role: Role = users::table
                    .find(manager_id)
                    .select(users::role)
                    .first(conn)
                    .await
                    .optional()?
                    .ok_or_else(|| CustomError::NotFound("User not found".to_string()))?;
                if target_role == Role::Admin {
                    return Err(CustomError::Conflict(
                        "Admins cannot be appointed as managers".to_string(),
                    ));
                }

                let already_managing: i64 = employment_records::table
                    .filter(employment_records::user_id.eq(manager_id))
                    .filter(employment_records::restaurant_id.eq(restaurant_id))
                    .filter(employment_records::staff_role.eq(StaffRole::Manager))
                    .filter(employment_records::status.eq(EmploymentStatus::Active))
                    .count()
                    .get_result(conn)
                    .await?;
                if already_managing > 0 {
                    return Err(CustomError::Conflict(
                        "User already manages this restaurant".to_string(),
                    ));
                }

                diesel::update(users::table.find(manager_id))
                    .set(users::role.eq(Role::Manager))
                    .execute(conn)
                    .await?;
                let record = diesel::insert_into(employment_records::table)
                    .values((
                        employment_records::id.eq(Uuid::new_v4()),
                        employment_records::user_id.eq(manager_id),
                        employment_records::restaurant_id.eq(restaurant_id),
                        employment_records::staff_role.eq(StaffRole::Manager),
                        employment_records::status.eq(EmploymentStatus::Active),
                    ))
                    .returning(EmploymentRecord::as_returning())
                    .get_result(conn)
                    .await?;
                Ok(record)
            }
            .scope_boxed()
        })
        .await?;
    tracing::info!(employment_id = %record.id, "Manager appointed");
    Ok(HttpResponse::Created().json(json!({"success": true, "employment": record})))
}
