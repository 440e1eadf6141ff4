pub mod add_note;
pub mod add_password;
pub mod init;
pub mod list;
pub mod show;
pub mod version;

pub use add_note::AddNote;
pub use add_password::AddPassword;
pub use init::Init;
pub use list::List;
pub use show::Show;
pub use version::Version;
