//! Values that can be rendered smoothly between logic ticks.
//!
//! The simulation advances in fixed ticks while frames are presented at whatever rate the host
//! manages. An [`Interp`] remembers the value it had at the end of the previous tick, so a
//! renderer can blend towards the current one without storing any per-frame history.

use crate::{
    fixed::{Angle, Fixed},
    shift::Shift,
};

/// Timing information supplied by the game loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Clock {
    /// The current logic tick. Advanced once per simulation update.
    pub game_tic: u32,
    /// How far the current frame is between the previous and the current tick, in 16.16 format
    /// (`0..=FRACUNIT`).
    pub lerp_factor: Fixed,
}

/// A value that can be linearly interpolated.
pub trait Lerp: Copy + PartialEq {
    /// Interpolates from `from` to `to` by `t` (16.16, `0..=FRACUNIT`).
    fn lerp(from: Self, to: Self, t: Fixed) -> Self;
}

impl Lerp for Fixed {
    /// Weights each endpoint separately: the difference of the samples is never computed.
    #[inline(always)]
    fn lerp(from: Self, to: Self, t: Fixed) -> Self {
        from * (Fixed::ONE - t) + to * t
    }
}

impl Lerp for Angle {
    /// Interpolates along the shortest arc between the two angles.
    ///
    /// The arc is arithmetically shifted down by 16 bits before scaling, in 32 bits: its low 16
    /// bits never contribute.
    #[inline(always)]
    fn lerp(from: Self, to: Self, t: Fixed) -> Self {
        let step = to.delta(from).right_shift::<16>().wrapping_mul(t.0);
        Angle(from.0.wrapping_add(step as u32))
    }
}

/// A value that remembers its previous tick's sample for interpolated rendering.
///
/// The previous sample is captured at most once per tick, the first time the value is assigned
/// in that tick. Further assignments within the same tick only change the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interp<T> {
    value: T,
    old_value: T,
    old_game_tic: u32,
}

pub type InterpFixed = Interp<Fixed>;
pub type InterpAngle = Interp<Angle>;

impl<T: Lerp + Default> Default for Interp<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Lerp> Interp<T> {
    /// Creates a new settled [`Interp`] with the given value.
    #[inline(always)]
    pub fn new(value: T) -> Self {
        Self {
            value,
            old_value: value,
            old_game_tic: 0,
        }
    }

    /// The current (simulation) value.
    #[inline(always)]
    pub fn value(&self) -> T {
        self.value
    }

    /// The value being interpolated from.
    #[inline(always)]
    pub fn old_value(&self) -> T {
        self.old_value
    }

    /// Whether there's nothing to interpolate.
    #[inline(always)]
    pub fn is_settled(&self) -> bool {
        self.value == self.old_value
    }

    /// Assigns a new value. If this is the first assignment in the current tick, the value it
    /// replaces becomes the interpolation source.
    #[inline(always)]
    pub fn set(&mut self, value: T, clock: Clock) {
        if clock.game_tic != self.old_game_tic {
            self.old_value = self.value;
            self.old_game_tic = clock.game_tic;
        }

        self.value = value;
    }

    /// Returns the value to render in the current frame.
    ///
    /// Once the tick has advanced past the one in which the value changed, the interpolation is
    /// over and the value snaps.
    pub fn render_value(&mut self, clock: Clock) -> T {
        if self.value == self.old_value {
            return self.value;
        }

        if clock.game_tic > self.old_game_tic {
            self.old_value = self.value;
            self.old_game_tic = 0;
            return self.value;
        }

        T::lerp(self.old_value, self.value, clock.lerp_factor)
    }

    /// Like [`Interp::render_value`], but only interpolates if `interpolate` is `true`. Otherwise,
    /// returns the current value as is.
    #[inline(always)]
    pub fn render_value_if(&mut self, clock: Clock, interpolate: bool) -> T {
        if interpolate {
            self.render_value(clock)
        } else {
            self.value
        }
    }

    /// Ends any ongoing interpolation, e.g. after a teleport.
    #[inline(always)]
    pub fn snap(&mut self) {
        self.old_value = self.value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::FRACUNIT;
    use proptest::prelude::*;

    fn clock(game_tic: u32, lerp_factor: i32) -> Clock {
        Clock {
            game_tic,
            lerp_factor: Fixed(lerp_factor),
        }
    }

    #[test]
    fn same_tick_assignments_keep_first_source() {
        let mut value = InterpFixed::new(Fixed::from_int(0));

        value.set(Fixed::from_int(100), clock(1, 0));
        value.set(Fixed::from_int(200), clock(1, 0));
        assert_eq!(value.old_value(), Fixed::from_int(0));

        // halfway between 0 and 200, not between 100 and 200
        let rendered = value.render_value(clock(1, FRACUNIT / 2));
        assert_eq!(rendered, Fixed::from_int(100));
        assert!(!value.is_settled());
    }

    #[test]
    fn snaps_once_tick_advances() {
        let mut value = InterpFixed::new(Fixed::from_int(0));
        value.set(Fixed::from_int(200), clock(1, 0));

        assert_eq!(value.render_value(clock(2, FRACUNIT / 4)), Fixed::from_int(200));
        assert!(value.is_settled());
        assert_eq!(value.render_value(clock(2, FRACUNIT / 4)), Fixed::from_int(200));
    }

    #[test]
    fn new_tick_captures_previous_value() {
        let mut value = InterpFixed::new(Fixed::from_int(0));
        value.set(Fixed::from_int(10), clock(1, 0));
        value.set(Fixed::from_int(20), clock(2, 0));

        assert_eq!(value.old_value(), Fixed::from_int(10));
        assert_eq!(value.render_value(clock(2, 0)), Fixed::from_int(10));
        assert_eq!(value.render_value(clock(2, FRACUNIT)), Fixed::from_int(20));
    }

    #[test]
    fn predicate_and_snap() {
        let mut value = InterpFixed::new(Fixed::from_int(0));
        value.set(Fixed::from_int(8), clock(3, 0));

        assert_eq!(value.render_value_if(clock(3, FRACUNIT / 2), false), Fixed::from_int(8));
        assert_eq!(value.render_value_if(clock(3, FRACUNIT / 2), true), Fixed::from_int(4));

        value.snap();
        assert_eq!(value.render_value(clock(3, FRACUNIT / 2)), Fixed::from_int(8));
    }

    #[test]
    fn angles_take_the_short_way() {
        let mut angle = InterpAngle::new(Angle(0u32.wrapping_sub(0x10_0000)));
        angle.set(Angle(0x10_0000), clock(1, 0));

        assert_eq!(angle.render_value(clock(1, FRACUNIT / 2)), Angle(0));
    }

    #[test]
    fn angle_arcs_drop_their_low_bits() {
        let half = Fixed(FRACUNIT / 2);

        assert_eq!(Angle::lerp(Angle(0), Angle(0xFFFF), half), Angle(0));
        assert_eq!(Angle::lerp(Angle(0x1_0000), Angle(0), half), Angle(0x8000));
        assert_eq!(Angle::lerp(Angle(0), Angle::ANG90, half), Angle::ANG45);
        assert_eq!(Angle::lerp(Angle::ANG90, Angle::ANG270, Fixed::ONE), Angle::ANG270);
    }

    #[test]
    fn far_apart_samples_do_not_overflow() {
        let half = Fixed(FRACUNIT / 2);
        let from = Fixed::from_int(-20000);
        let to = Fixed::from_int(20000);
        assert_eq!(Fixed::lerp(from, to, half), Fixed::ZERO);

        let mut value = InterpFixed::new(from);
        value.set(to, clock(1, 0));
        assert_eq!(value.render_value(clock(1, FRACUNIT / 2)), Fixed::ZERO);
        assert_eq!(value.render_value(clock(1, FRACUNIT / 4)), Fixed::from_int(-10000));
    }

    proptest::proptest! {
        #[test]
        fn endpoints(from in any::<i32>(), to in any::<i32>()) {
            prop_assert_eq!(Fixed::lerp(Fixed(from), Fixed(to), Fixed::ZERO), Fixed(from));
            prop_assert_eq!(Fixed::lerp(Fixed(from), Fixed(to), Fixed::ONE), Fixed(to));
        }

        #[test]
        fn settled_values_render_as_is(v in any::<i32>(), tic in any::<u32>(), t in 0..=FRACUNIT) {
            let mut value = InterpFixed::new(Fixed(v));
            prop_assert_eq!(value.render_value(clock(tic, t)), Fixed(v));
        }
    }
}
