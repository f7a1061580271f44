//! Unit tests for rp-core primitives.

#[cfg(test)]
mod ids {
    use crate::{CustomerId, NodeId, VehicleId};

    #[test]
    fn index_and_from() {
        let id = CustomerId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(usize::from(id), 42);
    }

    #[test]
    fn ordering() {
        assert!(VehicleId(0) < VehicleId(1));
        assert!(NodeId(100) > NodeId(99));
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(CustomerId::INVALID.0, u32::MAX);
        assert_eq!(VehicleId::default(), VehicleId::INVALID);
    }

    #[test]
    fn display_prefixes() {
        assert_eq!(CustomerId(7).to_string(), "cust7");
        assert_eq!(VehicleId(3).to_string(), "vehl3");
        assert_eq!(NodeId(12).to_string(), "node12");
    }
}

#[cfg(test)]
mod time {
    use crate::{Clock, SimTime, VirtualClock};

    #[test]
    fn instant_arithmetic() {
        let t = SimTime(100);
        assert_eq!(t + 30, SimTime(130));
        assert_eq!(t.offset(-30), SimTime(70));
        assert_eq!(SimTime(130) - t, 30);
        assert_eq!(t.since(SimTime(130)), -30);
    }

    #[test]
    fn virtual_clock_is_monotone() {
        let clock = VirtualClock::new(SimTime(50));
        assert_eq!(clock.now(), SimTime(50));

        clock.advance(10);
        assert_eq!(clock.now(), SimTime(60));

        // A stale writer cannot move time backwards.
        clock.set(SimTime(40));
        assert_eq!(clock.now(), SimTime(60));
        clock.set(SimTime(90));
        assert_eq!(clock.now(), SimTime(90));

        clock.advance(-5);
        assert_eq!(clock.now(), SimTime(90));
    }
}

#[cfg(test)]
mod units {
    use crate::Speed;

    #[test]
    fn travel_time_divides_by_speed() {
        let s = Speed::new(20.0);
        assert_eq!(s.travel_secs(400), 20.0);
        assert_eq!(s.travel_secs(0), 0.0);
    }

    #[test]
    fn reach_saturates_at_zero() {
        let s = Speed::new(10.0);
        assert_eq!(s.reach_meters(30), 300);
        assert_eq!(s.reach_meters(0), 0);
        assert_eq!(s.reach_meters(-5), 0);
    }
}

#[cfg(test)]
mod geo {
    use crate::GeoPoint;

    #[test]
    fn zero_distance() {
        let p = GeoPoint::new(116.4, 39.9);
        assert!(p.distance_m(p) < 0.01);
    }

    #[test]
    fn one_degree_of_latitude() {
        // ~1 degree of latitude ≈ 111 km anywhere on the globe.
        let a = GeoPoint::new(116.0, 39.0);
        let b = GeoPoint::new(116.0, 40.0);
        let d = a.distance_m(b);
        assert!((d - 111_195.0).abs() < 500.0, "got {d}");
    }
}
