use std::convert::Infallible;

use warp::{reject::Rejection, Filter};

use super::jwt::{verify_jwt_session, JwtSessionData, SessionData};

/// Requires a valid session cookie; the rejection carries the 401 mapping.
pub fn with_session() -> impl Filter<Extract = (SessionData,), Error = Rejection> + Copy {
    warp::cookie::<String>("session").and_then(|session: String| async move {
        match verify_jwt_session(session) {
            Ok(data) => Ok::<SessionData, Rejection>(data.into()),
            Err(e) => Err(warp::reject::custom(e)),
        }
    })
}

/// Anonymous callers pass through as `None`; a missing or invalid cookie is
/// not an error here.
pub fn with_possible_session(
) -> impl Filter<Extract = (Option<SessionData>,), Error = Infallible> + Copy {
    warp::cookie::optional::<String>("session").map(move |session: Option<String>| {
        session
            .and_then(|token| verify_jwt_session(token).ok())
            .map(|data: JwtSessionData| -> SessionData { data.into() })
    })
}
