pub use super::api_tokens::Entity as ApiTokens;
pub use super::users::Entity as Users;
