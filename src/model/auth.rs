//! Request identity.
//!
//! Authentication lives outside this service: the gateway forwards the
//! acting user's id in the `X-User-Id` header, and we resolve their role
//! against the roster. Admin capability is checked here, once, so route
//! handlers can simply take an [`AdminIdentity`] parameter.

use rocket::{
    http::Status,
    outcome::try_outcome,
    request::{self, FromRequest, Request},
};

use crate::model::{
    db::member::{Member, Role},
    mongodb::{Coll, Id},
};

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug)]
pub enum IdentityError {
    /// No `X-User-Id` header, or an unparseable one.
    Unauthenticated,
    /// The id does not match any roster member.
    UnknownMember,
    /// The member exists but lacks the required role.
    Forbidden,
    /// The roster lookup itself failed.
    Db(mongodb::error::Error),
}

/// The acting member, resolved from the `X-User-Id` header.
#[derive(Debug, Clone, Copy)]
pub struct MemberIdentity {
    pub id: Id,
    pub role: Role,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for MemberIdentity {
    type Error = IdentityError;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let id = match req
            .headers()
            .get_one(USER_ID_HEADER)
            .and_then(|value| value.parse::<Id>().ok())
        {
            Some(id) => id,
            None => {
                return request::Outcome::Failure((
                    Status::Unauthorized,
                    IdentityError::Unauthenticated,
                ))
            }
        };

        let members = req.guard::<Coll<Member>>().await.unwrap(); // Infallible.
        match members.find_one(id.as_doc(), None).await {
            Ok(Some(member)) => request::Outcome::Success(MemberIdentity {
                id: member.id,
                role: member.role,
            }),
            Ok(None) => {
                request::Outcome::Failure((Status::Unauthorized, IdentityError::UnknownMember))
            }
            Err(err) => {
                error!("Roster lookup failed during authentication: {err}");
                request::Outcome::Failure((Status::InternalServerError, IdentityError::Db(err)))
            }
        }
    }
}

/// An identity that has been checked for the admin role.
/// Every admin-surface route requires one of these.
#[derive(Debug, Clone, Copy)]
pub struct AdminIdentity {
    pub id: Id,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminIdentity {
    type Error = IdentityError;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let member = try_outcome!(req.guard::<MemberIdentity>().await);
        if member.role.is_admin() {
            request::Outcome::Success(AdminIdentity { id: member.id })
        } else {
            warn!("Member {} attempted an admin operation", member.id);
            request::Outcome::Failure((Status::Forbidden, IdentityError::Forbidden))
        }
    }
}
