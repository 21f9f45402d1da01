//! Customer accounts: registration, login and profile management.

use sqlx::PgPool;
use tracing::{debug, info};

use priceworth_core::{CustomerId, Role, check_password_strength};

use crate::db::{CartRepository, CustomerRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::models::customer::{
    ActiveChange, Credentials, Customer, CustomerProfile, PasswordChange, Registration,
    TokenResponse,
};
use crate::services::auth::{
    AuthError, Identity, TokenKeys, hash_password, verify_password,
};

/// Customer account service.
pub struct CustomerService<'a> {
    customers: CustomerRepository<'a>,
    carts: CartRepository<'a>,
    tokens: &'a TokenKeys,
}

impl<'a> CustomerService<'a> {
    /// Create a new customer service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenKeys) -> Self {
        Self {
            customers: CustomerRepository::new(pool),
            carts: CartRepository::new(pool),
            tokens,
        }
    }

    /// Register a customer on an existing, unclaimed cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the email is registered, the cart is
    /// already claimed or the password is weak.
    /// Returns `AppError::NotFound` if the cart does not exist.
    pub async fn register(&self, registration: Registration) -> Result<TokenResponse> {
        if self.customers.email_taken(&registration.email).await? {
            return Err(AppError::BadRequest(
                "This email has been registered, please login instead".to_string(),
            ));
        }
        if !self.carts.exists(registration.shopping_cart_id).await? {
            return Err(AppError::NotFound(
                "The shopping cart cannot be found".to_string(),
            ));
        }
        if self
            .customers
            .cart_claimed(registration.shopping_cart_id)
            .await?
        {
            return Err(invalid_cart());
        }
        check_password_strength(&registration.password).map_err(AuthError::from)?;

        let password_hash = hash_password(&registration.password)?;
        let customer = self
            .customers
            .create(&registration, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(msg) if msg.contains("cart") => invalid_cart(),
                RepositoryError::ForeignKey(_) => {
                    AppError::NotFound("The shopping cart cannot be found".to_string())
                }
                other => other.into(),
            })?;

        info!(customer_id = %customer.id, "Customer registered");
        self.token_for(customer.id)
    }

    /// Exchange email and password for a token.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` (400) if the email is unknown, the password
    /// does not match or the account is deactivated.
    pub async fn login(&self, credentials: Credentials) -> Result<TokenResponse> {
        let (customer, password_hash) = self
            .customers
            .get_with_password(&credentials.email)
            .await?
            .ok_or(AuthError::UnknownEmail)?;

        verify_password(&credentials.password, &password_hash)?;
        if !customer.active {
            debug!(customer_id = %customer.id, "Login refused for inactive customer");
            return Err(AuthError::Inactive.into());
        }

        info!(customer_id = %customer.id, "Customer logged in");
        self.token_for(customer.id)
    }

    /// A customer by id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the customer does not exist.
    pub async fn get(&self, id: CustomerId) -> Result<Customer> {
        self.customers
            .get(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// The customer behind a verified token.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the customer no longer exists.
    pub async fn get_current(&self, identity: Identity) -> Result<Customer> {
        self.get(CustomerId::new(identity.id)).await
    }

    /// Replace the profile fields.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the customer does not exist.
    pub async fn update_info(&self, id: CustomerId, profile: CustomerProfile) -> Result<Customer> {
        let customer = self
            .customers
            .update_profile(id, &profile)
            .await?
            .ok_or_else(|| not_found(id))?;

        info!(customer_id = %id, "Customer profile updated");
        Ok(customer)
    }

    /// Set a new password.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the password is weak.
    /// Returns `AppError::NotFound` if the customer does not exist.
    pub async fn update_password(&self, id: CustomerId, change: PasswordChange) -> Result<Customer> {
        check_password_strength(&change.password).map_err(AuthError::from)?;
        let password_hash = hash_password(&change.password)?;

        if !self.customers.update_password_hash(id, &password_hash).await? {
            return Err(not_found(id));
        }

        info!(customer_id = %id, "Customer password changed");
        self.get(id).await
    }

    /// Activate or deactivate an account.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the customer does not exist.
    pub async fn update_active(&self, id: CustomerId, change: ActiveChange) -> Result<Customer> {
        let customer = self
            .customers
            .set_active(id, change.active)
            .await?
            .ok_or_else(|| not_found(id))?;

        info!(customer_id = %id, active = change.active, "Customer activation changed");
        Ok(customer)
    }

    /// Delete a customer. Their orders remain as guest orders.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the customer does not exist.
    pub async fn delete(&self, id: CustomerId) -> Result<()> {
        if !self.customers.delete(id).await? {
            return Err(not_found(id));
        }
        info!(customer_id = %id, "Customer deleted");
        Ok(())
    }

    fn token_for(&self, id: CustomerId) -> Result<TokenResponse> {
        let token = self.tokens.issue(id.as_i32(), Role::Customer)?;
        Ok(TokenResponse { token })
    }
}

fn not_found(id: CustomerId) -> AppError {
    AppError::NotFound(format!("Customer with ID #{id} not found"))
}

fn invalid_cart() -> AppError {
    AppError::BadRequest("This shopping cart is invalid".to_string())
}
