use crate::{
    config::Config,
    services::{FileService, FolderService, UserService},
};

pub mod files;
pub mod folders;
pub mod health;
pub mod users;

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub folders: FolderService,
    pub files: FileService,
    pub config: Config,
}
