//! Load status transition rules driven by geofence proximity.

use crate::models::LoadStatus;

/// Compute the next automatic status for a load, or `None` when nothing
/// should change.
///
/// Transition table:
///
/// | current                    | condition      | next            |
/// |----------------------------|----------------|-----------------|
/// | Assigned, EnRoutePickup    | near pickup    | AtPickup        |
/// | AtPickup, Loaded           | near delivery  | AtDelivery      |
/// | AtPickup, Loaded           | left pickup    | EnRouteDelivery |
/// | EnRouteDelivery            | near delivery  | AtDelivery      |
/// | AtDelivery, Delivered      | never          | None            |
///
/// `AtDelivery` never advances to `Delivered` here: that step requires a
/// proof-of-delivery confirmation outside this subsystem's authority.
/// Callers persist a change only when `Some(next)` differs from `current`,
/// which this function already guarantees.
///
/// Known quirk, kept intentionally: from `AtPickup`/`Loaded`, merely leaving
/// the pickup geofence flips the load to `EnRouteDelivery` even if the truck
/// is idling just past the boundary. There is no hysteresis, so a truck
/// drifting on the edge can transition earlier than a dispatcher would
/// expect.
pub fn next_status(
    current: LoadStatus,
    near_pickup: bool,
    near_delivery: bool,
) -> Option<LoadStatus> {
    let next = match current {
        LoadStatus::Assigned | LoadStatus::EnRoutePickup if near_pickup => LoadStatus::AtPickup,
        LoadStatus::AtPickup | LoadStatus::Loaded if near_delivery => LoadStatus::AtDelivery,
        LoadStatus::AtPickup | LoadStatus::Loaded if !near_pickup => LoadStatus::EnRouteDelivery,
        LoadStatus::EnRouteDelivery if near_delivery => LoadStatus::AtDelivery,
        _ => return None,
    };

    if next == current {
        None
    } else {
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LoadStatus::*;

    #[test]
    fn arriving_at_pickup() {
        assert_eq!(next_status(Assigned, true, false), Some(AtPickup));
        assert_eq!(next_status(EnRoutePickup, true, false), Some(AtPickup));
    }

    #[test]
    fn no_change_while_heading_to_pickup() {
        assert_eq!(next_status(Assigned, false, false), None);
        assert_eq!(next_status(EnRoutePickup, false, false), None);
    }

    #[test]
    fn leaving_pickup_starts_the_delivery_leg() {
        assert_eq!(next_status(AtPickup, false, false), Some(EnRouteDelivery));
        assert_eq!(next_status(Loaded, false, false), Some(EnRouteDelivery));
    }

    #[test]
    fn still_at_pickup_means_no_change() {
        assert_eq!(next_status(AtPickup, true, false), None);
        assert_eq!(next_status(Loaded, true, false), None);
    }

    #[test]
    fn delivery_takes_precedence_over_en_route() {
        // Short hauls can be near delivery while barely leaving pickup.
        assert_eq!(next_status(Loaded, false, true), Some(AtDelivery));
        assert_eq!(next_status(AtPickup, true, true), Some(AtDelivery));
    }

    #[test]
    fn arriving_at_delivery() {
        assert_eq!(next_status(EnRouteDelivery, true, true), Some(AtDelivery));
        assert_eq!(next_status(EnRouteDelivery, false, true), Some(AtDelivery));
        assert_eq!(next_status(EnRouteDelivery, false, false), None);
    }

    #[test]
    fn terminal_states_never_advance_automatically() {
        for near_pickup in [false, true] {
            for near_delivery in [false, true] {
                assert_eq!(next_status(AtDelivery, near_pickup, near_delivery), None);
                assert_eq!(next_status(Delivered, near_pickup, near_delivery), None);
            }
        }
    }
}
