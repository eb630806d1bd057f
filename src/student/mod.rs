//! Student records and academic transitions.
//!
//! This module contains everything related to students:
//! - The `Student` model and admission/update database functions
//! - The searchable, paginated student list and the detail page
//! - The bulk academic-year and term transitions

mod core;
mod create;
mod detail;
mod edit;
mod list;
mod promote;

pub use core::{
    GRADE_MAX, GRADE_MIN, NewStudent, Student, StudentStatus, StudentUpdate, create_student,
    create_student_table, get_student, grade_label,
};
pub use create::{create_student_endpoint, get_new_student_page};
pub use detail::get_student_page;
pub use edit::{get_edit_student_page, update_student_endpoint};
pub use list::get_students_page;
pub use promote::{promote_students_endpoint, update_term_endpoint};

pub(crate) use core::{
    StudentFilter, count_active_students, count_students, list_students, students_in_grade,
    update_student,
};
