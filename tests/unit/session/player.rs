use super::*;
use crate::{model::step::VizMode, timeline::stages::BACKPROP_START};

fn steps(n: u64) -> Vec<Step> {
    (0..n)
        .map(|i| {
            let mut tokens = vec!["The".to_owned(), " cat".to_owned()];
            tokens.extend((0..i).map(|k| format!(" w{k}")));
            Step::from_tokens(i, tokens)
        })
        .collect()
}

fn player(view: View, n: u64) -> StepPlayer {
    let opts = MountOpts {
        view,
        anim_duration: 0.05,
        ..MountOpts::default()
    };
    StepPlayer::new(steps(n), opts, 100).unwrap()
}

#[test]
fn next_walks_substeps_then_steps() {
    let mut p = player(View::TextGeneration, 2);
    let max = View::TextGeneration.max_substep();
    for s in 1..=max {
        assert!(p.next().unwrap());
        assert_eq!(p.mount().sub_step(), s);
    }
    assert!(p.next().unwrap());
    assert_eq!(p.index(), 1);
    assert_eq!(p.mount().step().step, 1);
    assert_eq!(p.mount().sub_step(), 0);

    p.mount_mut().jump_to_substep(max);
    assert!(!p.next().unwrap());
}

#[test]
fn prev_goes_back_across_steps() {
    let mut p = player(View::TextGeneration, 2);
    assert!(!p.prev().unwrap());
    p.next().unwrap();
    assert!(p.prev().unwrap());
    assert_eq!(p.mount().sub_step(), 0);

    let max = View::TextGeneration.max_substep();
    p.mount_mut().jump_to_substep(max);
    p.next().unwrap();
    assert_eq!(p.index(), 1);
    assert!(p.prev().unwrap());
    assert_eq!(p.index(), 0);
    assert_eq!(p.mount().sub_step(), max);
    assert!(!p.mount().is_animating());
}

#[test]
fn autoplay_advances_on_the_timer() {
    let mut p = player(View::TextGeneration, 2);
    p.play(0).unwrap();
    assert!(p.is_playing());
    assert_eq!(p.tick(50, 0.05).unwrap(), PlaybackEvent::Idle);
    assert_eq!(p.tick(100, 0.05).unwrap(), PlaybackEvent::AdvanceSubStep);
    assert_eq!(p.mount().sub_step(), 1);

    p.pause().unwrap();
    assert_eq!(p.tick(1_000, 0.05).unwrap(), PlaybackEvent::Idle);
    assert_eq!(p.mount().sub_step(), 1);
}

#[test]
fn text_generation_swaps_steps_immediately() {
    let mut p = player(View::TextGeneration, 2);
    p.mount_mut().jump_to_substep(View::TextGeneration.max_substep());
    p.play(0).unwrap();
    assert_eq!(p.tick(100, 1.0).unwrap(), PlaybackEvent::AdvanceStep);
    assert!(!p.is_holding());
    assert_eq!(p.mount().step().step, 1);
}

#[test]
fn training_holds_the_previous_step_for_one_tick() {
    let mut p = player(View::Training, 2);
    let max = View::Training.max_substep();
    p.mount_mut().jump_to_substep(max);
    p.play(0).unwrap();

    assert_eq!(p.tick(100, 1.0).unwrap(), PlaybackEvent::AdvanceStep);
    assert!(p.is_holding());
    assert_eq!(p.index(), 1);
    assert_eq!(p.mount().step().step, 0);
    assert_eq!(p.mount().sub_step(), max);

    assert_eq!(p.tick(200, 0.0).unwrap(), PlaybackEvent::AdvanceSubStep);
    assert!(!p.is_holding());
    assert_eq!(p.mount().step().step, 1);
    assert_eq!(p.mount().sub_step(), 0);
    assert!(p.mount().is_animating());
}

#[test]
fn playback_stops_at_the_end() {
    let mut p = player(View::TextGeneration, 1);
    p.mount_mut().jump_to_substep(View::TextGeneration.max_substep());
    p.play(0).unwrap();
    assert_eq!(p.tick(100, 1.0).unwrap(), PlaybackEvent::Finished);
    assert!(!p.is_playing());
}

#[test]
fn empty_example_is_inert() {
    let mut p = player(View::TextGeneration, 0);
    assert!(p.mount().roots().main.is_empty());
    assert!(p.next().unwrap());
    assert!(p.mount().roots().main.is_empty());
}

#[test]
fn forward_only_training_steps_skip_backprop() {
    let mut steps = steps(2);
    steps[0].viz_mode = Some(VizMode::Forward);
    steps[1].viz_mode = Some(VizMode::Backprop);
    let opts = MountOpts {
        view: View::Training,
        anim_duration: 0.05,
        ..MountOpts::default()
    };
    let mut p = StepPlayer::new(steps, opts, 100).unwrap();
    assert_eq!(p.mount().last_substep(), BACKPROP_START - 1);
    for s in 1..BACKPROP_START {
        assert!(p.next().unwrap());
        assert_eq!(p.mount().sub_step(), s);
    }
    assert!(p.next().unwrap());
    assert_eq!(p.index(), 1);
    assert_eq!(p.mount().last_substep(), View::Training.max_substep());
}
