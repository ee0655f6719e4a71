//! Servo rig: actuators, gestures, and the playback clock

mod clock;
mod gesture;
mod servo;

pub use clock::PlaybackClock;
pub use gesture::{GestureGenerator, GestureSettings, gesture_rng};
pub use servo::{Actuator, ActuatorDriver, AngleRange, LogActuator, NoopActuator, Servo};

/// The mouth servo plus any arm servos
#[derive(Debug)]
pub struct Rig {
    /// Servo that tracks loudness
    pub mouth: Servo,
    /// Servos driven by idle gestures
    pub arms: Vec<Servo>,
}

impl Rig {
    /// Assemble a rig from already-built servos
    #[must_use]
    pub const fn new(mouth: Servo, arms: Vec<Servo>) -> Self {
        Self { mouth, arms }
    }

    /// Build the standard mouth + two arms rig on one driver
    #[must_use]
    pub fn with_driver(driver: ActuatorDriver, mouth: AngleRange, arm: AngleRange) -> Self {
        let arms = (1..=2)
            .map(|i| {
                let name = format!("arm-{i}");
                let actuator = driver.build(&name);
                Servo::new(name, arm, actuator)
            })
            .collect();

        Self::new(Servo::new("mouth", mouth, driver.build("mouth")), arms)
    }

    /// Send every servo to its rest angle
    pub fn rest(&mut self) {
        self.mouth.rest();
        for arm in &mut self.arms {
            arm.rest();
        }
    }
}
