//! Seats, seat classes, and the fixed layout of a train run.

use serde::{Deserialize, Serialize};

/// Service class a seat belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeatClass {
    /// Business class.
    Business,
    /// First class.
    FirstClass,
    /// Second class.
    SecondClass,
}

impl SeatClass {
    /// Returns the class as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatClass::Business => "Business",
            SeatClass::FirstClass => "FirstClass",
            SeatClass::SecondClass => "SecondClass",
        }
    }

    /// Parses a class from its string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Business" => Some(SeatClass::Business),
            "FirstClass" => Some(SeatClass::FirstClass),
            "SecondClass" => Some(SeatClass::SecondClass),
            _ => None,
        }
    }
}

impl std::fmt::Display for SeatClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Physical seat position: coach number plus seat number within the coach.
///
/// Ordering is coach first, then seat number; allocation scans seats in
/// this order, which is what makes it deterministic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SeatId {
    /// Coach number within the train.
    pub coach: u16,

    /// Seat number within the coach.
    pub number: u16,
}

impl SeatId {
    /// Creates a seat ID.
    pub fn new(coach: u16, number: u16) -> Self {
        Self { coach, number }
    }
}

impl std::fmt::Display for SeatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.coach, self.number)
    }
}

/// One seat in a run's layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Where the seat is.
    pub id: SeatId,

    /// The class it is sold as.
    pub class: SeatClass,
}

/// Immutable coach/seat layout of a train run.
///
/// Built once when the run is scheduled; seats are kept sorted by
/// `SeatId` so class scans walk coaches and seats in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainLayout {
    seats: Vec<Seat>,
}

impl TrainLayout {
    /// Starts building a layout.
    pub fn builder() -> TrainLayoutBuilder {
        TrainLayoutBuilder { seats: Vec::new() }
    }

    /// Returns all seats in allocation order.
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    /// Returns the seats of one class, still in allocation order.
    pub fn seats_of_class(&self, class: SeatClass) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter(move |s| s.class == class)
    }

    /// Total number of seats.
    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }
}

/// Builder for [`TrainLayout`].
#[derive(Debug, Default)]
pub struct TrainLayoutBuilder {
    seats: Vec<Seat>,
}

impl TrainLayoutBuilder {
    /// Adds a coach of `seat_count` seats numbered from 1, all of `class`.
    pub fn coach(mut self, coach: u16, class: SeatClass, seat_count: u16) -> Self {
        for number in 1..=seat_count {
            self.seats.push(Seat {
                id: SeatId::new(coach, number),
                class,
            });
        }
        self
    }

    /// Finishes the layout, sorting seats into allocation order.
    pub fn build(mut self) -> TrainLayout {
        self.seats.sort_by_key(|s| s.id);
        TrainLayout { seats: self.seats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_id_orders_by_coach_then_number() {
        let mut seats = vec![
            SeatId::new(2, 1),
            SeatId::new(1, 10),
            SeatId::new(1, 2),
            SeatId::new(2, 3),
        ];
        seats.sort();
        assert_eq!(
            seats,
            vec![
                SeatId::new(1, 2),
                SeatId::new(1, 10),
                SeatId::new(2, 1),
                SeatId::new(2, 3),
            ]
        );
    }

    #[test]
    fn seat_id_display() {
        assert_eq!(SeatId::new(3, 14).to_string(), "3-14");
    }

    #[test]
    fn seat_class_string_roundtrip() {
        for class in [
            SeatClass::Business,
            SeatClass::FirstClass,
            SeatClass::SecondClass,
        ] {
            assert_eq!(SeatClass::parse(class.as_str()), Some(class));
        }
        assert_eq!(SeatClass::parse("Economy"), None);
    }

    #[test]
    fn builder_sorts_out_of_order_coaches() {
        let layout = TrainLayout::builder()
            .coach(2, SeatClass::SecondClass, 2)
            .coach(1, SeatClass::FirstClass, 2)
            .build();

        let ids: Vec<_> = layout.seats().iter().map(|s| s.id).collect();
        assert_eq!(
            ids,
            vec![
                SeatId::new(1, 1),
                SeatId::new(1, 2),
                SeatId::new(2, 1),
                SeatId::new(2, 2),
            ]
        );
    }

    #[test]
    fn seats_of_class_filters_and_keeps_order() {
        let layout = TrainLayout::builder()
            .coach(1, SeatClass::FirstClass, 1)
            .coach(2, SeatClass::SecondClass, 3)
            .coach(3, SeatClass::FirstClass, 1)
            .build();

        let first: Vec<_> = layout
            .seats_of_class(SeatClass::FirstClass)
            .map(|s| s.id)
            .collect();
        assert_eq!(first, vec![SeatId::new(1, 1), SeatId::new(3, 1)]);
        assert_eq!(layout.seats_of_class(SeatClass::Business).count(), 0);
        assert_eq!(layout.seat_count(), 5);
    }
}
