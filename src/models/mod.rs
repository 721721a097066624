pub mod booking;
pub mod command;
pub mod extension;
pub mod money;
pub mod status;
pub mod visitor;

pub use booking::{Booking, BookingRoom, RoomType};
pub use command::{
    ExtensionCommand, StatusCommand, VisitorCheckoutCommand, VisitorCommand, VisitorStatusCommand,
};
pub use extension::{PaymentMethod, RoomExtension};
pub use money::Money;
pub use status::{ApprovalStatus, BookingStatus, CatalogError, StatusCatalog, StatusScope, VisitorStatus};
pub use visitor::VisitorLog;
