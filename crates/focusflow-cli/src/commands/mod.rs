pub mod blocked;
pub mod daemon;
pub mod focus;
pub mod helpers;
pub mod init;
pub mod prefs;
pub mod sites;
