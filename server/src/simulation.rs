//! Authoritative ball-and-paddle physics advanced once per tick.

use rand::Rng;
use shared::{
    Paddles, Role, Score, Vec2, FIELD_HALF_HEIGHT, GOAL_LINE_X, PADDLE_HALF_HEIGHT,
    PADDLE_PLANE_X, RALLY_SPEEDUP, SERVE_SPEED_X, SERVE_SPEED_Y, SERVE_VERTICAL_SPREAD,
};

/// Result of advancing the simulation by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No winner yet; the caller should broadcast the updated state.
    Continue,
    /// A side reached the winning score. No further ticks may run and the
    /// game-over notice must be the last message of the session.
    Finished(Role),
}

/// Ball, paddles and scores for one session.
///
/// Paddle offsets are overwritten by the session manager whenever a player
/// input arrives; everything else is mutated only by `step`.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub ball: Vec2,
    pub velocity: Vec2,
    pub paddles: Paddles,
    pub score: Score,
    winning_score: u32,
}

impl Simulation {
    pub fn new(winning_score: u32) -> Self {
        Self {
            ball: Vec2::default(),
            velocity: Vec2::new(SERVE_SPEED_X, SERVE_SPEED_Y),
            paddles: Paddles::default(),
            score: Score::default(),
            winning_score,
        }
    }

    /// Overwrites the paddle bound to `role`. Spectators have no paddle.
    pub fn set_paddle(&mut self, role: Role, offset: f32) {
        match role {
            Role::Left => self.paddles.left = offset,
            Role::Right => self.paddles.right = offset,
            Role::Spectator => {}
        }
    }

    /// Advances the state by `dt` seconds.
    ///
    /// Evaluation order within a tick is fixed: wall bounce, then paddle
    /// collision, then scoring and the win check. Paddle hits scale the
    /// horizontal speed by a constant factor with no cap; speed escalation
    /// within a rally is unbounded.
    pub fn step(&mut self, dt: f32, rng: &mut impl Rng) -> StepOutcome {
        self.ball = self.ball.add(&self.velocity.scale(dt));

        // Top/bottom wall bounce
        if self.ball.y > FIELD_HALF_HEIGHT || self.ball.y < -FIELD_HALF_HEIGHT {
            self.velocity.y = -self.velocity.y;
        }

        // Left paddle
        if self.ball.x < -PADDLE_PLANE_X
            && (self.ball.y - self.paddles.left).abs() < PADDLE_HALF_HEIGHT
        {
            self.velocity.x = self.velocity.x.abs() * RALLY_SPEEDUP;
        }

        // Right paddle
        if self.ball.x > PADDLE_PLANE_X
            && (self.ball.y - self.paddles.right).abs() < PADDLE_HALF_HEIGHT
        {
            self.velocity.x = -self.velocity.x.abs() * RALLY_SPEEDUP;
        }

        // A ball past either goal line is a miss; the opposing side scores
        if self.ball.x < -GOAL_LINE_X {
            self.score.p2 += 1;
            self.reset_ball(rng);
        }
        if self.ball.x > GOAL_LINE_X {
            self.score.p1 += 1;
            self.reset_ball(rng);
        }

        if self.score.p1 >= self.winning_score {
            return StepOutcome::Finished(Role::Left);
        }
        if self.score.p2 >= self.winning_score {
            return StepOutcome::Finished(Role::Right);
        }

        StepOutcome::Continue
    }

    /// Recenters the ball and serves it in a random direction with a random
    /// vertical component.
    fn reset_ball(&mut self, rng: &mut impl Rng) {
        self.ball = Vec2::default();
        let dir = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        self.velocity.x = SERVE_SPEED_X * dir;
        self.velocity.y = (rng.gen::<f32>() - 0.5) * SERVE_VERTICAL_SPREAD;
    }
}
