pub mod course;
pub mod lecture;
pub mod profile;
pub mod referral_link;
pub mod relationship_manager;
pub mod week;

pub use course::{Course, CourseDetail, NewCourseRequest, UpdateCourseRequest};
pub use lecture::{Lecture, LectureView, NewLectureRequest, UpdateLectureRequest};
pub use profile::{NewProfileRequest, Profile};
pub use referral_link::{NewReferralLinkRequest, ReferralLink};
pub use relationship_manager::{NewRelationshipManagerRequest, RelationshipManager};
pub use week::{NewWeekRequest, UpdateWeekRequest, Week, WeekDetail};
