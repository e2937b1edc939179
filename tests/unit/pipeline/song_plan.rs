use super::*;
use crate::config::model::OverlayKind;
use crate::visibility::TransitionMode;

fn image(group: &str, duration_s: f64) -> OverlayDecl {
    OverlayDecl {
        kind: OverlayKind::Image {
            path: "logo.png".into(),
            x: "0".to_owned(),
            y: "0".to_owned(),
        },
        group: Some(group.to_owned()),
        duration_s: Some(duration_s),
    }
}

#[test]
fn plan_chains_strategy_schedule_and_visibility() {
    let overlays = vec![image("lower_third", 10.0), image("logo", 5.0)];
    let transitions = TransitionConfig {
        mode: TransitionMode::Fade,
        duration_s: 1.0,
    };
    let plan = plan_song(&overlays, 47.0, &transitions).unwrap();
    assert_eq!(plan.strategy.target_duration, 45.0);
    assert_eq!(plan.strategy.truncate_amount, 2.0);

    let logo = plan.visibility_of("logo").unwrap();
    assert_eq!(logo.gate.eval(12.0), 1.0);
    assert_eq!(logo.gate.eval(16.0), 0.0);
    assert_eq!(logo.alpha.as_ref().unwrap().eval(12.5), 1.0);

    let json = plan.to_json();
    assert_eq!(json["strategy"]["target_duration"], 45.0);
    assert_eq!(json["groups"][0]["name"], "lower_third");
    assert_eq!(json["groups"][1]["intervals"][2]["start"], 40.0);
    assert!(json["groups"][1]["alpha"].is_string());
}

#[test]
fn no_groups_plans_plain_background() {
    let plan = plan_song(&[], 33.0, &TransitionConfig::default()).unwrap();
    assert_eq!(plan.strategy.target_duration, 33.0);
    assert!(plan.schedule.is_empty());
    assert!(plan.visibility.is_empty());
}

#[test]
fn inconsistent_groups_fail_the_plan() {
    let overlays = vec![image("g", 10.0), image("g", 4.0)];
    assert!(plan_song(&overlays, 47.0, &TransitionConfig::default()).is_err());
}
