use smithay::utils::Point;

use super::{commit, count, fixture};
use crate::{
    cursor::GrabCursor,
    errors::ShellError,
    grabs::GrabKind,
    ids::{ClientGrabId, PanelId},
    seat::{BTN_LEFT, ButtonState},
    state::ShellEvent,
};

#[test]
fn client_grab_needs_a_bound_desktop() {
    let mut f = fixture();
    assert_eq!(
        f.shell.create_grab(ClientGrabId::new(1)),
        Err(ShellError::NotBound)
    );
    assert_eq!(f.shell.grab_kind(f.seat), None);
}

#[test]
fn client_grab_reports_pointer_until_terminated() {
    let mut f = fixture();
    f.shell.bind(f.desktop).unwrap();
    let grab = ClientGrabId::new(1);
    f.shell.create_grab(grab).unwrap();
    assert_eq!(f.shell.grab_kind(f.seat), Some(GrabKind::Client(grab)));
    f.shell.drain_events();

    f.shell.pointer_motion(f.seat, 5, Point::from((30.0, 40.0)));
    f.shell.pointer_button(f.seat, 6, BTN_LEFT, ButtonState::Pressed);
    let events = f.shell.drain_events();
    assert!(events.contains(&ShellEvent::GrabMotion {
        grab,
        time: 5,
        location: Point::from((30.0, 40.0)),
    }));
    assert!(events.contains(&ShellEvent::GrabButton {
        grab,
        time: 6,
        button: BTN_LEFT,
        state: ButtonState::Pressed,
    }));

    f.shell.terminate_grab(grab).unwrap();
    assert_eq!(f.shell.grab_kind(f.seat), None);
    let events = f.shell.drain_events();
    assert_eq!(count(&events, |e| matches!(e, ShellEvent::GrabEnded(_))), 0);
    assert_eq!(
        f.shell.terminate_grab(grab),
        Err(ShellError::UnknownGrab(grab))
    );
}

#[test]
fn superseded_client_grab_is_told_it_ended() {
    let mut f = fixture();
    f.shell.bind(f.desktop).unwrap();
    let first = ClientGrabId::new(2);
    let second = ClientGrabId::new(3);
    f.shell.create_grab(first).unwrap();
    f.shell.drain_events();

    f.shell.create_grab(second).unwrap();
    assert_eq!(f.shell.drain_events(), vec![ShellEvent::GrabEnded(first)]);
    assert_eq!(f.shell.grab_kind(f.seat), Some(GrabKind::Client(second)));
    assert_eq!(
        f.shell.terminate_grab(first),
        Err(ShellError::UnknownGrab(first))
    );
}

#[test]
fn dragging_a_panel_docks_it_to_the_nearest_edge() {
    let mut f = fixture();
    let surface = f.shell.create_surface(f.desktop).unwrap();
    let panel = PanelId::new(1);
    f.shell.set_panel(panel, f.output, surface, 0).unwrap();
    commit(&mut f.shell, surface, 800, 30);

    f.shell.pointer_motion(f.seat, 0, Point::from((10.0, 10.0)));
    f.shell.pointer_button(f.seat, 1, BTN_LEFT, ButtonState::Pressed);
    f.shell.panel_move(panel, f.seat).unwrap();
    assert_eq!(f.shell.grab_kind(f.seat), Some(GrabKind::Panel(panel)));

    f.shell.pointer_motion(f.seat, 2, Point::from((400.0, 590.0)));
    f.shell.pointer_button(f.seat, 3, BTN_LEFT, ButtonState::Released);
    assert_eq!(f.shell.grab_kind(f.seat), None);

    let view = f.shell.output(f.output).unwrap().panel_views().next().unwrap();
    assert_eq!(f.shell.scene().view(view).unwrap().pos(), Point::from((0, 570)));
    let cursors: Vec<_> = f
        .shell
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            ShellEvent::GrabCursor { cursor, .. } => Some(cursor),
            _ => None,
        })
        .collect();
    assert_eq!(cursors, vec![Some(GrabCursor::Move), None]);
}

#[test]
fn destroying_a_panel_ends_its_drag() {
    let mut f = fixture();
    let surface = f.shell.create_surface(f.desktop).unwrap();
    let panel = PanelId::new(1);
    f.shell.set_panel(panel, f.output, surface, 0).unwrap();
    commit(&mut f.shell, surface, 800, 30);
    f.shell.panel_move(panel, f.seat).unwrap();

    f.shell.destroy_surface(surface).unwrap();
    assert_eq!(f.shell.grab_kind(f.seat), None);
    assert_eq!(
        f.shell.panel_move(panel, f.seat),
        Err(ShellError::UnknownPanel(panel))
    );
}
