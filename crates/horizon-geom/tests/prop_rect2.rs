use horizon_geom::{Rect2, Vec2, Vec3};
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = f32> {
    -1_000.0f32..1_000.0
}

fn arb_vec2() -> impl Strategy<Value = Vec2> {
    (coord(), coord()).prop_map(|(x, y)| Vec2::new(x, y))
}

fn arb_rect() -> impl Strategy<Value = Rect2> {
    (arb_vec2(), 0.0f32..500.0).prop_map(|(c, size)| Rect2::from_center_size(c, size))
}

proptest! {
    // Points inside (or on) the rectangle are at distance zero
    #[test]
    fn rect_contains_implies_zero_distance(r in arb_rect(), tx in 0.0f32..=1.0, ty in 0.0f32..=1.0) {
        let p = Vec2::new(
            r.min.x + (r.max.x - r.min.x) * tx,
            r.min.y + (r.max.y - r.min.y) * ty,
        );
        prop_assert_eq!(r.distance_sq(p), 0.0);
    }

    // Distance to the rectangle never exceeds distance to its center
    #[test]
    fn rect_distance_bounded_by_center(r in arb_rect(), p in arb_vec2()) {
        let to_center = (p - r.center()).length();
        prop_assert!(r.distance(p) <= to_center + 1e-3);
        prop_assert!(r.distance_sq(p) >= 0.0);
    }

    // Cross product is orthogonal to both operands (small magnitudes)
    #[test]
    fn vec3_cross_orthogonal(
        ax in -10.0f32..10.0, ay in -10.0f32..10.0, az in -10.0f32..10.0,
        bx in -10.0f32..10.0, by in -10.0f32..10.0, bz in -10.0f32..10.0,
    ) {
        let a = Vec3::new(ax, ay, az);
        let b = Vec3::new(bx, by, bz);
        let c = a.cross(b);
        prop_assert!(a.dot(c).abs() <= 1e-2);
        prop_assert!(b.dot(c).abs() <= 1e-2);
    }
}
