pub mod email;
pub mod files;
pub mod folders;
pub mod storage;
pub mod users;

pub use email::{spawn_email_worker, EmailJob, EmailService, Mailer};
pub use files::FileService;
pub use folders::FolderService;
pub use storage::{FileStorageService, HttpObjectStore, ObjectStore, StorageBucket};
pub use users::UserService;
