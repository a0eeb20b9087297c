use std::{convert::Infallible, net::IpAddr};

use rocket::{
  request::{FromRequest, Outcome},
  Request,
};

use crate::{models::user::AuthenticatedUser, schema::reactions};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubjectKind {
  Event,
  Comment,
}

impl SubjectKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      SubjectKind::Event => "event",
      SubjectKind::Comment => "comment",
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReactionKind {
  Like,
  Dislike,
  View,
}

impl ReactionKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ReactionKind::Like => "like",
      ReactionKind::Dislike => "dislike",
      ReactionKind::View => "view",
    }
  }

  /// Reactions in the same group exclude each other: an actor gets one vote (like or dislike)
  /// and one view per subject.
  pub fn group(&self) -> &'static str {
    match self {
      ReactionKind::Like | ReactionKind::Dislike => "vote",
      ReactionKind::View => "view",
    }
  }
}

#[derive(Insertable)]
#[diesel(table_name = reactions)]
pub struct NewReaction {
  pub subject_kind: String,
  pub subject_id: i64,
  pub actor: String,
  pub reaction_group: String,
  pub kind: String,
}

impl NewReaction {
  pub fn new(subject: SubjectKind, subject_id: i64, actor: &Actor, kind: ReactionKind) -> Self {
    NewReaction {
      subject_kind: subject.as_str().to_owned(),
      subject_id,
      actor: actor.0.clone(),
      reaction_group: kind.group().to_owned(),
      kind: kind.as_str().to_owned(),
    }
  }
}

/// The identity reactions are recorded against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor(pub String);

impl Actor {
  pub fn resolve(user_id: Option<i64>, client_id: Option<&str>, ip: Option<IpAddr>) -> Actor {
    if let Some(user_id) = user_id {
      return Actor(format!("user:{}", user_id));
    }
    if let Some(client_id) = client_id.map(str::trim).filter(|id| !id.is_empty()) {
      return Actor(format!("client:{}", client_id));
    }
    match ip {
      Some(ip) => Actor(format!("ip:{}", ip)),
      None => Actor(String::from("anonymous")),
    }
  }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Actor {
  type Error = Infallible;

  async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
    let user_id = match AuthenticatedUser::from_request(request).await {
      Outcome::Success(AuthenticatedUser(user)) => Some(user.id),
      _ => None,
    };
    let client_id = request.headers().get_one("X-Client-Id");
    Outcome::Success(Actor::resolve(user_id, client_id, request.client_ip()))
  }
}

#[test]
fn test_actor_resolution_order() {
  let ip: IpAddr = "10.0.0.7".parse().unwrap();
  assert_eq!(
    Actor::resolve(Some(4), Some("abc"), Some(ip)),
    Actor(String::from("user:4"))
  );
  assert_eq!(
    Actor::resolve(None, Some(" abc "), Some(ip)),
    Actor(String::from("client:abc"))
  );
  assert_eq!(
    Actor::resolve(None, Some(""), Some(ip)),
    Actor(String::from("ip:10.0.0.7"))
  );
  assert_eq!(
    Actor::resolve(None, None, None),
    Actor(String::from("anonymous"))
  );
}

#[test]
fn test_like_and_dislike_share_a_group() {
  assert_eq!(ReactionKind::Like.group(), ReactionKind::Dislike.group());
  assert_ne!(ReactionKind::Like.group(), ReactionKind::View.group());
}
