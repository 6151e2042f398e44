mod floor;
mod rooms;
mod rules;

pub use floor::{Connector, FloorPlan};
pub use rooms::{AreaConstraint, AreaUnit, RoomData};
pub use rules::{CountRule, DynamicRules, ShapeRule};
