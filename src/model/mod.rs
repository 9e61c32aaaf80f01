//! Wire-level data model: operations, parameters, decoded documents and the
//! typed results built from them.

pub mod document;
pub mod operation;
pub mod params;
pub mod request;
pub mod response;

pub use document::{Document, Element};
pub use operation::Operation;
pub use params::Params;
pub use request::{
    HitFromType, HitParams, HitTypeParams, NewQualificationType, Notification, NotificationTransport,
    PageRequest,
};
pub use response::*;
