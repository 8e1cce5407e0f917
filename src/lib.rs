pub mod size;
pub mod title;
pub mod constraints;
pub mod registry;
pub mod layout;
pub mod validator;
pub mod policy;
pub mod bootstrap;

pub use title::{TitleId, TitleIdError};
pub use constraints::{SaveLayoutConstraints, ConstraintsSpec, PixelFormat};
pub use registry::{TitlePolicyRegistry, QuirkGroup};
pub use layout::{CandidateSaveLayout, MemberEntry};
pub use validator::{validate, ValidationResult, Violation, ViolationCode, Warning};
pub use policy::{PolicyDecision, PolicyResolver};
pub use bootstrap::{AppContext, Bootstrap, BootstrapError, BootstrapOptions, StartupMode};
