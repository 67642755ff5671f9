use crate::model::role::Role;
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorForbidden,
    error::ErrorUnauthorized,
};
use futures::future::{Ready, ready};

/// Caller identity placed in request extensions by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub emp_id: Option<String>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(ErrorUnauthorized("Missing token"))),
        }
    }
}

impl AuthUser {
    /// Employee the caller acts as; accounts without one cannot track attendance
    pub fn emp_id(&self) -> actix_web::Result<&str> {
        self.emp_id
            .as_deref()
            .ok_or_else(|| ErrorForbidden("No employee profile"))
    }

    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ErrorForbidden("Admin only"))
        }
    }

    pub fn require_hr_or_admin(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Admin | Role::Hr) {
            Ok(())
        } else {
            Err(ErrorForbidden("HR/Admin only"))
        }
    }

    /// Employees may read their own data, HR and Admin anyone's
    pub fn require_self_or_hr(&self, emp_id: &str) -> actix_web::Result<()> {
        if self.emp_id.as_deref() == Some(emp_id) {
            return Ok(());
        }
        self.require_hr_or_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, emp_id: Option<&str>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "jane".into(),
            role,
            emp_id: emp_id.map(str::to_string),
        }
    }

    #[test]
    fn role_checks() {
        assert!(user(Role::Admin, None).require_admin().is_ok());
        assert!(user(Role::Hr, None).require_admin().is_err());
        assert!(user(Role::Hr, None).require_hr_or_admin().is_ok());
        assert!(user(Role::Employee, None).require_hr_or_admin().is_err());
    }

    #[test]
    fn own_data_or_hr() {
        let employee = user(Role::Employee, Some("EMP001"));
        assert!(employee.require_self_or_hr("EMP001").is_ok());
        assert!(employee.require_self_or_hr("EMP002").is_err());
        assert!(user(Role::Hr, None).require_self_or_hr("EMP002").is_ok());
    }

    #[test]
    fn emp_id_is_required_for_attendance() {
        assert_eq!(user(Role::Employee, Some("EMP001")).emp_id().unwrap(), "EMP001");
        assert!(user(Role::Admin, None).emp_id().is_err());
    }

    #[actix_web::test]
    async fn extractor_reads_extensions() {
        let req = actix_web::test::TestRequest::default().to_http_request();
        assert!(AuthUser::extract(&req).await.is_err());

        req.extensions_mut().insert(user(Role::Employee, Some("EMP001")));
        let extracted = AuthUser::extract(&req).await.unwrap();
        assert_eq!(extracted.emp_id.as_deref(), Some("EMP001"));
    }
}
