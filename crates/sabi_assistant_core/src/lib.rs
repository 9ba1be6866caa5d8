pub mod domain;
pub mod password;
pub mod ports;
pub mod prompt;

pub use domain::{Account, AccountCredentials, AuthSession, Exchange, Language, Mode, ModeCount};
pub use password::{PasswordPolicy, PasswordWeakness};
pub use ports::{
    CompletionOptions, CompletionService, DatabaseService, GatewayError, GatewayErrorKind,
    LinkSafetyService, PortError, PortResult, SafetyVerdict,
};
pub use prompt::build_prompt;
