//! Customer and address repositories.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use petal_core::{AddressId, CustomerId, Email, Phone};

use super::{Page, Paginated, RepositoryError, like_pattern};
use crate::models::{Address, Customer};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    phone: String,
    name: String,
    email: Option<String>,
    phone_verified_at: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let phone = Phone::parse(&row.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;

        Ok(Self {
            id: CustomerId::new(row.id),
            phone,
            name: row.name,
            email,
            phone_verified_at: row.phone_verified_at,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    customer_id: i32,
    label: Option<String>,
    recipient_name: String,
    phone: String,
    street: String,
    building: Option<String>,
    area: Option<String>,
    city: String,
    postal_code: Option<String>,
    notes: Option<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            customer_id: CustomerId::new(row.customer_id),
            label: row.label,
            recipient_name: row.recipient_name,
            phone: row.phone,
            street: row.street,
            building: row.building,
            area: row.area,
            city: row.city,
            postal_code: row.postal_code,
            notes: row.notes,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const CUSTOMER_COLUMNS: &str =
    "id, phone, name, email, phone_verified_at, is_active, created_at, updated_at";

const ADDRESS_COLUMNS: &str = "id, customer_id, label, recipient_name, phone, street, building, \
     area, city, postal_code, notes, is_default, created_at, updated_at";

// =============================================================================
// Customers
// =============================================================================

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

    /// Get a customer by normalized phone number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_phone(&self, phone: &Phone) -> Result<Option<Customer>, RepositoryError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE phone = $1");
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(phone)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a customer whose phone was just verified.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the phone is already registered.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        phone: &Phone,
        name: &str,
        email: Option<&Email>,
    ) -> Result<Customer, RepositoryError> {
        let sql = format!(
            "INSERT INTO customers (phone, name, email, phone_verified_at) \
             VALUES ($1, $2, $3, NOW()) \
             RETURNING {CUSTOMER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(phone)
            .bind(name)
            .bind(email)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_write(e, "customer with this phone"))?;

        row.try_into()
    }

    /// Record a successful phone verification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_phone_verified(&self, id: CustomerId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE customers SET phone_verified_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Update the editable profile fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_profile(
        &self,
        id: CustomerId,
        name: &str,
        email: Option<&Email>,
    ) -> Result<Customer, RepositoryError> {
        let sql = format!(
            "UPDATE customers SET name = $2, email = $3 WHERE id = $1 \
             RETURNING {CUSTOMER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .bind(name)
            .bind(email)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Set whether a customer may log in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    pub async fn set_active(&self, id: CustomerId, is_active: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE customers SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// List customers, newest first, optionally matching a name, phone or
    /// email search.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: Page,
    ) -> Result<Paginated<Customer>, RepositoryError> {
        let pattern = search.filter(|s| !s.trim().is_empty()).map(like_pattern);
        let where_sql = "($1::text IS NULL OR name ILIKE $1 OR phone ILIKE $1 OR email ILIKE $1)";

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM customers WHERE {where_sql}"))
                .bind(pattern.as_deref())
                .fetch_one(self.pool)
                .await?;

        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE {where_sql} \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(pattern.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        let customers = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Paginated::new(customers, page, total))
    }

    /// Delete a customer and everything that cascades from it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    pub async fn delete(&self, id: CustomerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

// =============================================================================
// Addresses
// =============================================================================

/// Fields of an address as submitted by the customer.
#[derive(Debug, Clone)]
pub struct AddressInput {
    pub label: Option<String>,
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub building: Option<String>,
    pub area: Option<String>,
    pub city: String,
    pub postal_code: Option<String>,
    pub notes: Option<String>,
    pub is_default: bool,
}

/// Repository for customer addresses.
///
/// Every query is scoped to the owning customer.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a customer's addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Address>, RepositoryError> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE customer_id = $1 \
             ORDER BY is_default DESC, created_at DESC"
        );
        let rows = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(customer_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get one of a customer's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_customer(
        &self,
        id: AddressId,
        customer_id: CustomerId,
    ) -> Result<Option<Address>, RepositoryError> {
        let sql =
            format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1 AND customer_id = $2");
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(id)
            .bind(customer_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Create an address. The first address is always the default; a new
    /// default clears the previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        customer_id: CustomerId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM addresses WHERE customer_id = $1")
                .bind(customer_id)
                .fetch_one(&mut *tx)
                .await?;
        let is_default = input.is_default || existing == 0;

        if is_default {
            sqlx::query("UPDATE addresses SET is_default = FALSE WHERE customer_id = $1")
                .bind(customer_id)
                .execute(&mut *tx)
                .await?;
        }

        let sql = format!(
            "INSERT INTO addresses (customer_id, label, recipient_name, phone, street, \
                 building, area, city, postal_code, notes, is_default) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {ADDRESS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(customer_id)
            .bind(input.label.as_deref())
            .bind(&input.recipient_name)
            .bind(&input.phone)
            .bind(&input.street)
            .bind(input.building.as_deref())
            .bind(input.area.as_deref())
            .bind(&input.city)
            .bind(input.postal_code.as_deref())
            .bind(input.notes.as_deref())
            .bind(is_default)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Replace an address's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not belong to
    /// the customer.
    pub async fn update(
        &self,
        id: AddressId,
        customer_id: CustomerId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            sqlx::query(
                "UPDATE addresses SET is_default = FALSE WHERE customer_id = $1 AND id <> $2",
            )
            .bind(customer_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        let sql = format!(
            "UPDATE addresses SET label = $3, recipient_name = $4, phone = $5, street = $6, \
                 building = $7, area = $8, city = $9, postal_code = $10, notes = $11, \
                 is_default = (is_default OR $12) \
             WHERE id = $1 AND customer_id = $2 \
             RETURNING {ADDRESS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(id)
            .bind(customer_id)
            .bind(input.label.as_deref())
            .bind(&input.recipient_name)
            .bind(&input.phone)
            .bind(&input.street)
            .bind(input.building.as_deref())
            .bind(input.area.as_deref())
            .bind(&input.city)
            .bind(input.postal_code.as_deref())
            .bind(input.notes.as_deref())
            .bind(input.is_default)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Delete an address. When the default is deleted, the most recent
    /// remaining address becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not belong to
    /// the customer.
    pub async fn delete(&self, id: AddressId, customer_id: CustomerId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let was_default: bool = sqlx::query_scalar(
            "DELETE FROM addresses WHERE id = $1 AND customer_id = $2 RETURNING is_default",
        )
        .bind(id)
        .bind(customer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if was_default {
            sqlx::query(
                r"
                UPDATE addresses SET is_default = TRUE
                WHERE id = (
                    SELECT id FROM addresses WHERE customer_id = $1
                    ORDER BY created_at DESC, id DESC LIMIT 1
                )
                ",
            )
            .bind(customer_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
