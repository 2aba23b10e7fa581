pub mod course_lookup;
