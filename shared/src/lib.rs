use serde::{Deserialize, Serialize};

pub const TICK_RATE: u32 = 60;
pub const WINNING_SCORE: u32 = 5;
pub const FIELD_HALF_HEIGHT: f32 = 4.0;
pub const PADDLE_PLANE_X: f32 = 3.5;
pub const PADDLE_HALF_HEIGHT: f32 = 1.2;
pub const GOAL_LINE_X: f32 = 6.0;
pub const SERVE_SPEED_X: f32 = 3.0;
pub const SERVE_SPEED_Y: f32 = 1.0;
pub const SERVE_VERTICAL_SPREAD: f32 = 2.5;
pub const RALLY_SPEEDUP: f32 = 1.1;
pub const PADDLE_INPUT_SCALE: f32 = 4.0;

/// The capacity in which a connection participates in a session.
///
/// `Left` and `Right` are the two privileged slots that control paddles;
/// everyone else is a `Spectator`. Serialized as the lowercase strings the
/// wire protocol uses.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Left,
    Right,
    Spectator,
}

impl Role {
    /// The opposing privileged role, if this role is privileged.
    pub fn opponent(self) -> Option<Role> {
        match self {
            Role::Left => Some(Role::Right),
            Role::Right => Some(Role::Left),
            Role::Spectator => None,
        }
    }

    /// Returns true for the two paddle-controlling roles.
    pub fn is_player(self) -> bool {
        matches!(self, Role::Left | Role::Right)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the sum of two vectors.
    pub fn add(&self, other: &Vec2) -> Vec2 {
        Vec2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Returns the scaled vector.
    pub fn scale(&self, scalar: f32) -> Vec2 {
        Vec2 {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// Paddle offsets along the vertical axis, one per privileged role.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Paddles {
    pub left: f32,
    pub right: f32,
}

/// Points scored by each side. `p1` is the left player, `p2` the right.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    pub p1: u32,
    pub p2: u32,
}

/// Messages a client may send over an established connection.
///
/// Anything that fails to parse into this set is logged and dropped by the
/// gateway without affecting the connection or the session.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Vertical paddle offset, unconstrained on the wire; scaling into
    /// simulation coordinates happens server-side.
    PaddleMove { y: f32 },
}

/// Messages the server pushes to attached connections.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Sent once, immediately on attach.
    Assign { role: Role },
    /// Sent once, on the transition to active.
    GameStart,
    /// Sent once per tick while the session is active.
    State {
        ball: Vec2,
        paddles: Paddles,
        score: Score,
    },
    /// Sent exactly once, as the last message of the session.
    GameOver { winner: Role },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Left).unwrap(), "\"left\"");
        assert_eq!(serde_json::to_string(&Role::Right).unwrap(), "\"right\"");
        assert_eq!(
            serde_json::to_string(&Role::Spectator).unwrap(),
            "\"spectator\""
        );
    }

    #[test]
    fn test_role_opponent() {
        assert_eq!(Role::Left.opponent(), Some(Role::Right));
        assert_eq!(Role::Right.opponent(), Some(Role::Left));
        assert_eq!(Role::Spectator.opponent(), None);

        assert!(Role::Left.is_player());
        assert!(Role::Right.is_player());
        assert!(!Role::Spectator.is_player());
    }

    #[test]
    fn test_vec2_operations() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, -1.0);

        let sum = a.add(&b);
        assert_approx_eq!(sum.x, 4.0);
        assert_approx_eq!(sum.y, 1.0);

        let scaled = a.scale(0.5);
        assert_approx_eq!(scaled.x, 0.5);
        assert_approx_eq!(scaled.y, 1.0);
    }

    #[test]
    fn test_paddle_move_parsing() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"paddleMove","y":0.25}"#).unwrap();
        match msg {
            ClientMessage::PaddleMove { y } => assert_approx_eq!(y, 0.25),
        }
    }

    #[test]
    fn test_paddle_move_rejects_malformed_frames() {
        // Unknown message type
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"chat","text":"hi"}"#).is_err());
        // Missing payload field
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"paddleMove"}"#).is_err());
        // Non-numeric offset
        assert!(
            serde_json::from_str::<ClientMessage>(r#"{"type":"paddleMove","y":"up"}"#).is_err()
        );
        // Not JSON at all
        assert!(serde_json::from_str::<ClientMessage>("paddleMove 0.5").is_err());
    }

    #[test]
    fn test_assign_message_shape() {
        let msg = ServerMessage::Assign { role: Role::Left };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"type":"assign","role":"left"}"#
        );
    }

    #[test]
    fn test_game_start_message_shape() {
        assert_eq!(
            serde_json::to_string(&ServerMessage::GameStart).unwrap(),
            r#"{"type":"gameStart"}"#
        );
    }

    #[test]
    fn test_game_over_message_shape() {
        let msg = ServerMessage::GameOver {
            winner: Role::Right,
        };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"type":"gameOver","winner":"right"}"#
        );
    }

    #[test]
    fn test_state_message_shape() {
        let msg = ServerMessage::State {
            ball: Vec2::new(1.5, -2.0),
            paddles: Paddles {
                left: 0.5,
                right: -1.0,
            },
            score: Score { p1: 2, p2: 3 },
        };

        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();

        assert_eq!(value["type"], "state");
        assert_eq!(value["ball"]["x"], 1.5);
        assert_eq!(value["ball"]["y"], -2.0);
        assert_eq!(value["paddles"]["left"], 0.5);
        assert_eq!(value["paddles"]["right"], -1.0);
        assert_eq!(value["score"]["p1"], 2);
        assert_eq!(value["score"]["p2"], 3);
    }

    #[test]
    fn test_server_message_roundtrip() {
        let messages = vec![
            ServerMessage::Assign {
                role: Role::Spectator,
            },
            ServerMessage::GameStart,
            ServerMessage::State {
                ball: Vec2::new(0.0, 0.0),
                paddles: Paddles::default(),
                score: Score::default(),
            },
            ServerMessage::GameOver { winner: Role::Left },
        ];

        for msg in messages {
            let json = serde_json::to_string(&msg).unwrap();
            let back: ServerMessage = serde_json::from_str(&json).unwrap();
            assert_eq!(back, msg);
        }
    }
}
