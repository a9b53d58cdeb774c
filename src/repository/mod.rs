pub mod files;
pub mod folders;
pub mod users;

pub use files::{FileRepository, NewFile, PgFileRepository};
pub use folders::{FolderRepository, PgFolderRepository};
pub use users::{NewUser, PgUserRepository, UserRepository};
