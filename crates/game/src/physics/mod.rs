mod ball;
mod collide;
mod paddle;

pub use ball::{BallState, CONTACT_EPSILON};
pub use collide::{PaddleHit, ball_paddle_hit, resolve_paddle_hit};
pub use paddle::{MoveIntent, PaddleMotion, PaddleState};
