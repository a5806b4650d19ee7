mod extractor;

pub use extractor::{AuthUser, Role, USER_ID_HEADER, USER_ROLE_HEADER};
