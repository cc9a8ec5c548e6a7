use crate::api::task::{AssignBrigades, AssignBrigadesResponse};
use crate::api::worker::RegisterUser;
use crate::model::brigade::{BrigadeView, MemberView};
use crate::model::specialization::Specialization;
use crate::model::task::TaskView;
use crate::model::worker::{UserSummary, Worker};
use crate::models::MessageResponse;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Crewdesk API",
        version = "0.1.0",
        description = r#"
## Crew back office

Service behind the crews' Telegram bot and the office staff.

- **Workers**: registration from the bot, removal
- **Tasks**: open tasks per foreman/worker, brigade assignment with Telegram notification
- **Attendance**: monthly timesheet as an xlsx download

All endpoints require `Authorization: Bearer <API_TOKEN>`.
"#,
    ),
    paths(
        crate::api::attendance_report::download_attendance_report,

        crate::api::task::get_tasks,
        crate::api::task::assign_brigades,
        crate::api::task::delete_task,

        crate::api::worker::register_user,
        crate::api::worker::delete_worker,

        crate::api::specialization::get_specializations
    ),
    components(
        schemas(
            AssignBrigades,
            AssignBrigadesResponse,
            RegisterUser,
            MessageResponse,
            TaskView,
            BrigadeView,
            MemberView,
            UserSummary,
            Worker,
            Specialization
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance timesheet"),
        (name = "Task", description = "Task APIs for the bot"),
        (name = "Worker", description = "Worker registration and removal"),
        (name = "Specialization", description = "Specialization directory"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/api/download-attendance-report",
            "/api/tasks",
            "/api/tasks/{task_id}/brigades",
            "/api/tasks/{task_id}",
            "/api/register-user",
            "/api/workers/{worker_id}",
            "/api/specializations",
        ] {
            assert!(paths.iter().any(|p| p.as_str() == expected), "missing {expected}");
        }
        assert!(doc.components.unwrap().security_schemes.contains_key("bearer_auth"));
    }
}
