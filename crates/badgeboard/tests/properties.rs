use badgeboard::engine::{
    days_until, derive_status, is_candidate, set_badge, sync_credential, Presence,
};
use badgeboard::interchange::{parse_backup, to_json};
use badgeboard::model::{Boc, DocumentStatus, Employee, Snapshot, Vrf};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use proptest::test_runner::Config;

fn base_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap()
}

fn employee(id: &str) -> Employee {
    let mut e = Employee::new(id.to_string(), 1);
    e.first_name = "Test".to_string();
    e.last_name = id.to_string();
    e
}

fn boc(number: &str, expiry: &str, days: i64) -> Boc {
    Boc {
        id: format!("id-{number}"),
        boc_number: number.to_string(),
        boc_expiry: expiry.to_string(),
        boc_expiry_days: days,
        ..Boc::default()
    }
}

prop_compose! {
    fn arb_employee()(
        id in "[a-f0-9]{8}",
        no in 1_i64..500,
        first in "[A-Z][a-z]{1,8}",
        last in "[A-Z][a-z]{1,8}",
        boc_number in prop::option::of("B-[0-9]{1,3}"),
        badge in prop::option::of("BD-[0-9]{1,3}"),
        days in -30_i64..120,
        note in ".{0,20}",
    ) -> Employee {
        let mut e = Employee::new(id, no);
        e.first_name = first;
        e.last_name = last;
        e.boc_number = boc_number.unwrap_or_default();
        e.boc_expiry_days = days;
        e.badge = badge.unwrap_or_default();
        e.note = note;
        e
    }
}

prop_compose! {
    fn arb_vrf()(
        number in "V-[0-9]{1,3}",
        days in -30_i64..120,
        access in "[A-Za-z ]{0,12}",
        comments in prop::option::of("[a-z ]{1,12}"),
    ) -> Vrf {
        Vrf {
            id: format!("id-{number}"),
            vrf_number: number,
            vrf_expiry: "2024-02-01".to_string(),
            vrf_expiry_days: days,
            access,
            comments,
            ..Vrf::default()
        }
    }
}

proptest! {
    #![proptest_config(Config::with_cases(128))]

    #[test]
    fn unassigned_status_is_expired_iff_no_days_left(days in -1000_i64..1000) {
        let status = derive_status(days, false);
        prop_assert_eq!(status == DocumentStatus::Expired, days <= 0);
        if days > 0 {
            prop_assert_eq!(status, DocumentStatus::Available);
        }
    }

    #[test]
    fn expired_wins_over_assignment(days in -1000_i64..=0) {
        prop_assert_eq!(derive_status(days, true), DocumentStatus::Expired);
    }

    #[test]
    fn badge_clears_vrf(
        vrf in "V-[0-9]{1,4}",
        days in -50_i64..200,
        badge in "BD-[0-9]{1,4}",
    ) {
        let mut e = employee("e1");
        e.vrf_number = vrf;
        e.vrf_expiry = "2024-03-01".to_string();
        e.vrf_expiry_days = days;

        set_badge(&mut e, &badge);

        prop_assert_eq!(e.badge, badge);
        prop_assert_eq!(e.vrf_number, "");
        prop_assert_eq!(e.vrf_expiry, "");
        prop_assert_eq!(e.vrf_expiry_days, 0);
    }

    #[test]
    fn boc_sync_is_idempotent(
        numbers in prop::collection::vec("B-[0-9]{1,2}", 1..6),
        pick in any::<prop::sample::Index>(),
        days in -30_i64..120,
    ) {
        let records: Vec<Boc> = numbers
            .iter()
            .map(|n| boc(n, "2024-02-01", days))
            .collect();
        let mut e = employee("e1");
        e.boc_number = pick.get(&numbers).clone();

        sync_credential(&mut e, &records);
        let once = e.clone();
        sync_credential(&mut e, &records);

        prop_assert_eq!(e, once);
    }

    #[test]
    fn presence_inside_interval(
        before in 0_i64..10_000,
        after in 0_i64..10_000,
    ) {
        let now = base_now();
        let arrival = (now - Duration::minutes(before)).to_rfc3339();
        let departure = (now + Duration::minutes(after)).to_rfc3339();
        prop_assert_eq!(Presence::resolve(&arrival, &departure, now), Presence::In);

        let later = now + Duration::minutes(after + 1);
        prop_assert_eq!(Presence::resolve(&arrival, &departure, later), Presence::Out);
    }

    #[test]
    fn day_count_sign_follows_expiry(offset_hours in -2000_i64..2000) {
        let now = base_now();
        let expiry = (now + Duration::hours(offset_hours)).to_rfc3339();
        let days = days_until(&expiry, now);
        prop_assert_eq!(days > 0, offset_hours > 0);
    }

    #[test]
    fn assigned_record_is_candidate_for_holder_only(
        number in "B-[0-9]{1,3}",
        other in "B-[0-9]{4}",
        days in 1_i64..365,
    ) {
        let mut record = boc(&number, "2024-06-01", days);
        record.status = DocumentStatus::Assigned;
        record.assigned_employee_id = Some("holder".to_string());

        prop_assert!(is_candidate(&record, Some(&number)));
        prop_assert!(!is_candidate(&record, Some(&other)));
        prop_assert!(!is_candidate(&record, None));
    }

    #[test]
    fn backup_round_trip(
        employees in prop::collection::vec(arb_employee(), 0..5),
        vrfs in prop::collection::vec(arb_vrf(), 0..5),
        boc_days in prop::collection::vec(-30_i64..120, 0..5),
    ) {
        let bocs = boc_days
            .iter()
            .enumerate()
            .map(|(i, d)| boc(&format!("B-{i}"), "2024-02-01", *d))
            .collect();
        let snapshot = Snapshot { employees, bocs, vrfs };

        let restored = parse_backup(&to_json(&snapshot).unwrap()).unwrap();
        prop_assert_eq!(restored, snapshot);
    }
}
