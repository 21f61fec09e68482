use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::{
    attendance, auth, certificates, classes, contents, exams, health, hostel, inventory, leaves,
    library, messaging, notices, radio, schools, students, tally, teachers, transport, uploads,
    users,
};
use scholaris_core::pagination::{PaginationMeta, PaginationParams};

pub use crate::modules::auth::controller::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::controller::login_user,
        auth::controller::refresh_token,
        auth::controller::get_profile,
        auth::controller::change_password,
        schools::controller::create_school,
        schools::controller::get_all_schools,
        schools::controller::get_school,
        schools::controller::update_school,
        schools::controller::delete_school,
        users::controller::create_user,
        users::controller::get_users,
        users::controller::get_user,
        users::controller::update_user,
        users::controller::delete_user,
        students::controller::create_student,
        students::controller::get_students,
        students::controller::get_my_children,
        students::controller::get_student,
        students::controller::update_student,
        students::controller::delete_student,
        teachers::controller::create_teacher,
        teachers::controller::get_teachers,
        teachers::controller::get_teacher,
        teachers::controller::update_teacher,
        teachers::controller::delete_teacher,
        teachers::controller::get_teacher_subjects,
        teachers::controller::assign_subjects,
        classes::controller::create_class,
        classes::controller::get_classes,
        classes::controller::get_class,
        classes::controller::update_class,
        classes::controller::delete_class,
        classes::controller::create_section,
        classes::controller::get_sections,
        classes::controller::update_section,
        classes::controller::delete_section,
        classes::controller::create_subject,
        classes::controller::get_subjects,
        classes::controller::get_subject,
        classes::controller::update_subject,
        classes::controller::delete_subject,
        attendance::controller::mark_attendance,
        attendance::controller::get_attendance,
        attendance::controller::get_student_summary,
        attendance::controller::check_in,
        attendance::controller::get_check_ins,
        attendance::controller::get_geofence_status,
        exams::controller::create_exam,
        exams::controller::get_exams,
        exams::controller::get_exam,
        exams::controller::update_exam,
        exams::controller::delete_exam,
        exams::controller::add_paper,
        exams::controller::get_papers,
        exams::controller::delete_paper,
        exams::controller::record_results,
        exams::controller::get_results,
        exams::controller::get_report_card,
        contents::controller::create_content,
        contents::controller::get_contents,
        contents::controller::get_content,
        contents::controller::update_content,
        contents::controller::delete_content,
        certificates::controller::create_certificate,
        certificates::controller::get_certificates,
        certificates::controller::get_certificate,
        certificates::controller::update_certificate,
        certificates::controller::delete_certificate,
        library::controller::create_book,
        library::controller::get_books,
        library::controller::get_book,
        library::controller::update_book,
        library::controller::delete_book,
        library::controller::issue_book,
        library::controller::return_book,
        library::controller::get_issues,
        hostel::controller::create_hostel,
        hostel::controller::get_hostels,
        hostel::controller::get_hostel,
        hostel::controller::update_hostel,
        hostel::controller::delete_hostel,
        hostel::controller::add_room,
        hostel::controller::get_rooms,
        hostel::controller::update_room,
        hostel::controller::delete_room,
        hostel::controller::allocate,
        hostel::controller::get_allocations,
        hostel::controller::release_allocation,
        inventory::controller::create_item,
        inventory::controller::get_items,
        inventory::controller::get_item,
        inventory::controller::update_item,
        inventory::controller::delete_item,
        inventory::controller::create_transaction,
        inventory::controller::get_transactions,
        transport::controller::create_bus,
        transport::controller::get_buses,
        transport::controller::get_bus,
        transport::controller::update_bus,
        transport::controller::delete_bus,
        transport::controller::get_bus_students,
        transport::controller::assign_student,
        transport::controller::unassign_student,
        messaging::controller::get_conversations,
        messaging::controller::create_conversation,
        messaging::controller::get_conversation,
        messaging::controller::get_messages,
        messaging::controller::send_message,
        messaging::controller::mark_read,
        messaging::controller::broadcast,
        notices::controller::create_notice,
        notices::controller::get_notices,
        notices::controller::get_notice,
        notices::controller::update_notice,
        notices::controller::delete_notice,
        notices::controller::create_newsletter,
        notices::controller::get_newsletters,
        notices::controller::get_newsletter,
        notices::controller::update_newsletter,
        notices::controller::delete_newsletter,
        leaves::controller::create_leave,
        leaves::controller::get_leaves,
        leaves::controller::get_leave,
        leaves::controller::parent_decision,
        leaves::controller::school_decision,
        leaves::controller::get_gate_pass,
        leaves::controller::verify_gate_pass,
        radio::controller::get_programs,
        radio::controller::create_program,
        radio::controller::update_program,
        radio::controller::delete_program,
        radio::controller::get_live,
        uploads::controller::upload_single,
        uploads::controller::upload_multiple,
        tally::controller::health,
        tally::controller::companies,
        tally::controller::ledgers,
        tally::controller::sales,
        tally::controller::auto_ledger,
        health::controller::health,
    ),
    components(
        schemas(
            ErrorResponse,
            PaginationMeta,
            PaginationParams,
            auth::model::LoginRequest,
            auth::model::LoginResponse,
            auth::model::RefreshTokenRequest,
            auth::model::RefreshTokenResponse,
            auth::model::ChangePasswordRequest,
            auth::model::MessageResponse,
            auth::model::ProfileResponse,
            users::model::User,
            users::model::UserRole,
            users::model::CreateUserDto,
            users::model::UpdateUserDto,
            users::model::PaginatedUsersResponse,
            schools::model::School,
            schools::model::CreateSchoolDto,
            schools::model::UpdateSchoolDto,
            schools::model::PaginatedSchoolsResponse,
            students::model::CreateStudentDto,
            teachers::model::CreateTeacherDto,
            teachers::model::AssignSubjectsDto,
            classes::model::Class,
            classes::model::ClassWithStats,
            classes::model::CreateClassDto,
            classes::model::UpdateClassDto,
            classes::model::PaginatedClassesResponse,
            classes::model::Section,
            classes::model::SectionDto,
            classes::model::Subject,
            classes::model::CreateSubjectDto,
            classes::model::UpdateSubjectDto,
            attendance::model::AttendanceStatus,
            attendance::model::AttendanceRecord,
            attendance::model::AttendanceEntry,
            attendance::model::MarkAttendanceDto,
            attendance::model::AttendanceSummary,
            attendance::model::CheckInDto,
            attendance::model::StaffCheckIn,
            attendance::model::GeofenceStatus,
            exams::model::Exam,
            exams::model::CreateExamDto,
            exams::model::UpdateExamDto,
            exams::model::ExamPaper,
            exams::model::CreatePaperDto,
            exams::model::ExamResult,
            exams::model::ResultEntry,
            exams::model::RecordResultsDto,
            exams::model::SubjectReport,
            exams::model::ReportCard,
            contents::model::ContentKind,
            contents::model::AcademicContent,
            contents::model::CreateContentDto,
            contents::model::UpdateContentDto,
            contents::model::PaginatedContentsResponse,
            certificates::model::Certificate,
            certificates::model::CreateCertificateDto,
            certificates::model::UpdateCertificateDto,
            library::model::Book,
            library::model::CreateBookDto,
            library::model::UpdateBookDto,
            library::model::PaginatedBooksResponse,
            library::model::BookIssue,
            library::model::IssueBookDto,
            library::model::ReturnBookDto,
            hostel::model::Hostel,
            hostel::model::CreateHostelDto,
            hostel::model::UpdateHostelDto,
            hostel::model::HostelRoom,
            hostel::model::CreateRoomDto,
            hostel::model::UpdateRoomDto,
            hostel::model::HostelAllocation,
            hostel::model::AllocateDto,
            inventory::model::InventoryDirection,
            inventory::model::InventoryItem,
            inventory::model::CreateItemDto,
            inventory::model::UpdateItemDto,
            inventory::model::PaginatedItemsResponse,
            inventory::model::InventoryTransaction,
            inventory::model::CreateTransactionDto,
            inventory::model::StockMovement,
            transport::model::Bus,
            transport::model::CreateBusDto,
            transport::model::UpdateBusDto,
            transport::model::BusAssignment,
            transport::model::AssignStudentDto,
            messaging::model::Conversation,
            messaging::model::ConversationSummary,
            messaging::model::Participant,
            messaging::model::ConversationDetail,
            messaging::model::Message,
            messaging::model::CreateConversationDto,
            messaging::model::SendMessageDto,
            messaging::model::PaginatedMessagesResponse,
            messaging::model::BroadcastDto,
            messaging::model::BroadcastResult,
            notices::model::Notice,
            notices::model::CreateNoticeDto,
            notices::model::UpdateNoticeDto,
            notices::model::PaginatedNoticesResponse,
            notices::model::Newsletter,
            notices::model::CreateNewsletterDto,
            notices::model::UpdateNewsletterDto,
            notices::model::PaginatedNewslettersResponse,
            leaves::model::LeaveStatus,
            leaves::model::LeaveRequest,
            leaves::model::CreateLeaveDto,
            leaves::model::LeaveDecisionDto,
            leaves::model::PaginatedLeavesResponse,
            leaves::model::GatePass,
            leaves::model::LeaveDecisionResponse,
            leaves::model::VerifyGatePassDto,
            leaves::model::GatePassVerification,
            radio::model::RadioProgram,
            radio::model::CreateProgramDto,
            radio::model::UpdateProgramDto,
            radio::model::PlaybackPlan,
            radio::model::LiveProgram,
            uploads::model::UploadedFile,
            uploads::model::UploadManyResponse,
            uploads::model::UploadForm,
            uploads::model::UploadManyForm,
            tally::model::TallyRecords,
            tally::model::TallyHealth,
            tally::model::AutoLedgerDto,
            health::model::HealthResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login, token refresh and password change"),
        (name = "Schools", description = "School tenants (system admin only)"),
        (name = "Users", description = "User management"),
        (name = "Students", description = "Student records and parent links"),
        (name = "Teachers", description = "Teacher records and subject assignments"),
        (name = "Classes", description = "Classes and sections"),
        (name = "Subjects", description = "Subjects taught per class"),
        (name = "Attendance", description = "Student attendance and geofenced staff check-in"),
        (name = "Exams", description = "Exams, papers, results and report cards"),
        (name = "Contents", description = "Assignments, homework, notes and syllabus"),
        (name = "Certificates", description = "Issued certificates"),
        (name = "Library", description = "Books, issues and returns"),
        (name = "Hostel", description = "Hostels, rooms and allocations"),
        (name = "Inventory", description = "Stock items and movements"),
        (name = "Transport", description = "Buses and student assignments"),
        (name = "Messaging", description = "Conversations and broadcasts"),
        (name = "Notices", description = "Notice board and newsletters"),
        (name = "Leaves", description = "Leave requests and gate passes"),
        (name = "Radio", description = "Scheduled e-learning radio programs"),
        (name = "Uploads", description = "File uploads"),
        (name = "Tally", description = "Accounting gateway proxy"),
        (name = "Health", description = "Liveness and database check")
    ),
    info(
        title = "Scholaris API",
        version = "0.1.0",
        description = "Multi-tenant school management REST API built with Rust, Axum, and PostgreSQL.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
