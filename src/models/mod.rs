pub mod breakdown;
pub mod course;
pub mod rate;
pub mod user;

pub use breakdown::{CostBreakdown, FairShare, FairShareEntry, IndividualEntry, IndividualValue};
pub use course::{Course, EnrolledCourse, NewCourseRequest, ParsedCourse, Weekday};
pub use rate::TuitionRate;
pub use user::{NewUserRequest, Program, StudentType, UpdateUserRequest, UserProfile};
