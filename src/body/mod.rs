mod gender;
mod model_type;
mod parametric;
mod smpl;

pub use gender::Gender;
pub use model_type::BodyModelType;
pub use parametric::ParametricBody;
pub use smpl::{SmplBody, SmplBuilder};
