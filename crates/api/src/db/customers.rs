//! Customer repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use priceworth_core::{CustomerId, Email, ShoppingCartId};

use super::RepositoryError;
use crate::models::customer::{Customer, CustomerProfile, Registration};

const CART_UNIQUE_CONSTRAINT: &str = "customer_shopping_cart_id_key";

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    gender: Option<String>,
    company: Option<String>,
    street_address: Option<String>,
    suburb: Option<String>,
    city: Option<String>,
    country: String,
    state: Option<String>,
    postcode: Option<String>,
    phone: Option<String>,
    date_of_birth: Option<String>,
    active: bool,
    shopping_cart_id: ShoppingCartId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: CustomerId::new(row.id),
            email,
            profile: CustomerProfile {
                first_name: row.first_name,
                last_name: row.last_name,
                gender: row.gender,
                company: row.company,
                street_address: row.street_address,
                suburb: row.suburb,
                city: row.city,
                country: row.country,
                state: row.state,
                postcode: row.postcode,
                phone: row.phone,
                date_of_birth: row.date_of_birth,
            },
            active: row.active,
            shopping_cart_id: row.shopping_cart_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerWithPasswordRow {
    #[sqlx(flatten)]
    customer: CustomerRow,
    password_hash: String,
}

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a customer by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, email, first_name, last_name, gender, company, street_address, suburb,
                   city, country, state, postcode, phone, date_of_birth, active,
                   shopping_cart_id, created_at, updated_at
            FROM shop.customer
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    /// Get a customer and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(Customer, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerWithPasswordRow>(
            r"
            SELECT id, email, first_name, last_name, gender, company, street_address, suburb,
                   city, country, state, postcode, phone, date_of_birth, active,
                   shopping_cart_id, created_at, updated_at, password_hash
            FROM shop.customer
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let customer = Customer::try_from(row.customer)?;
        Ok(Some((customer, row.password_hash)))
    }

    /// Whether a customer with this id exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: CustomerId) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM shop.customer WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        Ok(exists)
    }

    /// Whether the email is already registered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn email_taken(&self, email: &Email) -> Result<bool, RepositoryError> {
        let (taken,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM shop.customer WHERE email = $1)")
                .bind(email)
                .fetch_one(self.pool)
                .await?;

        Ok(taken)
    }

    /// Whether some customer already owns the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cart_claimed(&self, cart_id: ShoppingCartId) -> Result<bool, RepositoryError> {
        let (claimed,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM shop.customer WHERE shopping_cart_id = $1)",
        )
        .bind(cart_id)
        .fetch_one(self.pool)
        .await?;

        Ok(claimed)
    }

    /// The cart owned by a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cart_id(
        &self,
        id: CustomerId,
    ) -> Result<Option<ShoppingCartId>, RepositoryError> {
        let row: Option<(ShoppingCartId,)> =
            sqlx::query_as("SELECT shopping_cart_id FROM shop.customer WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(|(cart_id,)| cart_id))
    }

    /// Insert a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken or the cart is already claimed.
    /// Returns `RepositoryError::ForeignKey` if the cart does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        registration: &Registration,
        password_hash: &str,
    ) -> Result<Customer, RepositoryError> {
        let profile = &registration.profile;
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO shop.customer
                (email, password_hash, first_name, last_name, gender, company, street_address,
                 suburb, city, country, state, postcode, phone, date_of_birth, active,
                 shopping_cart_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING id, email, first_name, last_name, gender, company, street_address, suburb,
                      city, country, state, postcode, phone, date_of_birth, active,
                      shopping_cart_id, created_at, updated_at
            ",
        )
        .bind(&registration.email)
        .bind(password_hash)
        .bind(profile.first_name.as_deref())
        .bind(profile.last_name.as_deref())
        .bind(profile.gender.as_deref())
        .bind(profile.company.as_deref())
        .bind(profile.street_address.as_deref())
        .bind(profile.suburb.as_deref())
        .bind(profile.city.as_deref())
        .bind(&profile.country)
        .bind(profile.state.as_deref())
        .bind(profile.postcode.as_deref())
        .bind(profile.phone.as_deref())
        .bind(profile.date_of_birth.as_deref())
        .bind(registration.active)
        .bind(registration.shopping_cart_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    let what = if db_err.constraint() == Some(CART_UNIQUE_CONSTRAINT) {
                        "shopping cart already claimed"
                    } else {
                        "email already exists"
                    };
                    return RepositoryError::Conflict(what.to_owned());
                }
                if db_err.is_foreign_key_violation() {
                    return RepositoryError::ForeignKey("customer_shopping_cart_id_fkey".to_owned());
                }
            }
            RepositoryError::Database(e)
        })?;

        Customer::try_from(row)
    }

    /// Replace the profile fields. Returns `None` if the customer does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_profile(
        &self,
        id: CustomerId,
        profile: &CustomerProfile,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            UPDATE shop.customer
            SET first_name = $2, last_name = $3, gender = $4, company = $5,
                street_address = $6, suburb = $7, city = $8, country = $9, state = $10,
                postcode = $11, phone = $12, date_of_birth = $13, updated_at = now()
            WHERE id = $1
            RETURNING id, email, first_name, last_name, gender, company, street_address, suburb,
                      city, country, state, postcode, phone, date_of_birth, active,
                      shopping_cart_id, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(profile.first_name.as_deref())
        .bind(profile.last_name.as_deref())
        .bind(profile.gender.as_deref())
        .bind(profile.company.as_deref())
        .bind(profile.street_address.as_deref())
        .bind(profile.suburb.as_deref())
        .bind(profile.city.as_deref())
        .bind(&profile.country)
        .bind(profile.state.as_deref())
        .bind(profile.postcode.as_deref())
        .bind(profile.phone.as_deref())
        .bind(profile.date_of_birth.as_deref())
        .fetch_optional(self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    /// Store a new password hash. Returns `false` if the customer does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_password_hash(
        &self,
        id: CustomerId,
        password_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.customer SET password_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Activate or deactivate a customer. Returns `None` if the customer does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_active(
        &self,
        id: CustomerId,
        active: bool,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            UPDATE shop.customer
            SET active = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, email, first_name, last_name, gender, company, street_address, suburb,
                      city, country, state, postcode, phone, date_of_birth, active,
                      shopping_cart_id, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(active)
        .fetch_optional(self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }

    /// Delete a customer. Their orders are kept as guest orders.
    ///
    /// Returns `false` if the customer did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: CustomerId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.customer WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
