//! Registered users and password authentication.

use crate::prelude::*;
use crate::{db::connection::DbConnection, schema::users::dsl::*};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use latch_auth::{
    secret_hash::{hash_password, verify_decoy, verify_password},
    store::Principal,
};
use serde::{Deserialize, Serialize};

/// A registered user.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2 hash, never the plaintext.
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for registering a user. The password is hashed on insert.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
struct NewUser {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
}

impl UserCreate {
    /// Creates the user in the database.
    pub fn create(self, connection: &DbConnection) -> Result<User> {
        let conn = &mut connection.pool.get()?;
        let new_user = NewUser {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email.to_lowercase(),
            password: hash_password(&self.password)?,
        };

        Ok(diesel::insert_into(users)
            .values(new_user)
            .returning(User::as_returning())
            .get_result(conn)?)
    }
}

impl User {
    pub fn fetch_by_id(target: i64, connection: &DbConnection) -> Result<Self> {
        let conn = &mut connection.pool.get()?;

        Ok(users
            .filter(id.eq(target))
            .select(User::as_select())
            .get_result(conn)?)
    }

    /// Fetches a user by email, ignoring case.
    pub fn fetch_by_email(target: &str, connection: &DbConnection) -> Result<Self> {
        let conn = &mut connection.pool.get()?;

        Ok(users
            .filter(email.eq(target.to_lowercase()))
            .select(User::as_select())
            .get_result(conn)?)
    }

    /// Checks an email/password pair.
    ///
    /// An unknown email still pays for one Argon2 verification, so the two
    /// failure cases cannot be told apart by timing either.
    ///
    /// # Arguments
    ///
    /// * `target` - Email address, matched case-insensitively
    /// * `pw` - The plaintext password
    /// * `connection` - Database connection pool
    ///
    /// # Returns
    ///
    /// * `Ok(User)` - Credentials are valid
    /// * `Err(Error::WrongCredentials)` - Unknown email or wrong password
    /// * `Err(Error)` - Database or hashing failure
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use latch_models::{
    ///     auth::user::User,
    ///     db::{config::DbConfig, connection::DbConnection},
    /// };
    ///
    /// let db = DbConnection::new(&DbConfig::from_env().unwrap()).unwrap();
    /// let user = User::authenticate("jane@example.com", "correct horse", &db).unwrap();
    /// println!("{}", user.id);
    /// ```
    pub fn authenticate(target: &str, pw: &str, connection: &DbConnection) -> Result<Self> {
        let user = match Self::fetch_by_email(target, connection) {
            Ok(user) => user,
            Err(Error::Diesel(diesel::result::Error::NotFound)) => {
                verify_decoy(pw);
                return Err(Error::WrongCredentials);
            }
            Err(err) => return Err(err),
        };
        if !verify_password(&user.password, pw)? {
            return Err(Error::WrongCredentials);
        }
        Ok(user)
    }

    /// Replaces the stored password hash.
    pub fn update_password(&self, new_password: &str, connection: &DbConnection) -> Result<Self> {
        let conn = &mut connection.pool.get()?;
        let hash = hash_password(new_password)?;

        Ok(diesel::update(users.filter(id.eq(self.id)))
            .set((password.eq(hash), updated_at.eq(Utc::now())))
            .returning(User::as_returning())
            .get_result(conn)?)
    }
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_drops_password() {
        let now = Utc::now();
        let user = User {
            id: 4,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "$argon2id$...".to_string(),
            created_at: now,
            updated_at: now,
        };
        let principal = Principal::from(user);
        assert_eq!(principal.id, 4);
        assert_eq!(principal.email, "ada@example.com");
    }
}
