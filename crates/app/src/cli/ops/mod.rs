pub mod contact;
pub mod init;
pub mod inspect;
pub mod open;
pub mod seal;
pub mod version;
pub mod whoami;

pub use contact::Contact;
pub use init::Init;
pub use inspect::Inspect;
pub use open::Open;
pub use seal::Seal;
pub use version::Version;
pub use whoami::Whoami;
