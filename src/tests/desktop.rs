use smithay::{
    input::keyboard::{Keysym, ModifiersState},
    utils::{Point, Rectangle, Size},
};

use super::{commit, count, fixture, map_toplevel};
use crate::{
    desktop_shell::KeyModifiers,
    errors::ShellError,
    ids::{BindingId, PanelId, PopupId},
    seat::{BTN_LEFT, ButtonState, KeyState},
    state::ShellEvent,
};

#[test]
fn only_the_companion_client_may_bind() {
    let mut f = fixture();
    let stranger = f.shell.create_client(Some(99));
    assert_eq!(
        f.shell.bind(stranger),
        Err(ShellError::PermissionDenied(stranger))
    );
    assert!(!f.shell.desktop().is_bound());

    f.shell.drain_events();
    f.shell.bind(f.desktop).unwrap();
    let events = f.shell.drain_events();
    assert_eq!(
        count(&events, |e| matches!(e, ShellEvent::WorkspaceAdded(_))),
        4
    );
    assert!(events.contains(&ShellEvent::WorkspaceActivated {
        workspace: f.shell.pager().active(f.output).unwrap(),
        output: f.output,
    }));
    assert_eq!(events.last(), Some(&ShellEvent::Load));
}

#[test]
fn panel_moves_from_top_to_bottom() {
    let mut f = fixture();
    let surface = f.shell.create_surface(f.desktop).unwrap();
    let panel = PanelId::new(7);

    f.shell.set_panel(panel, f.output, surface, 0).unwrap();
    commit(&mut f.shell, surface, 800, 30);
    let output = f.shell.output(f.output).unwrap();
    assert_eq!(
        output.available_geometry(),
        Rectangle::new(Point::from((0, 30)), Size::from((800, 570)))
    );

    f.shell.set_panel(panel, f.output, surface, 2).unwrap();
    commit(&mut f.shell, surface, 800, 30);
    let output = f.shell.output(f.output).unwrap();
    let views: Vec<_> = output.panel_views().collect();
    assert_eq!(views.len(), 1);
    let view = f.shell.scene().view(views[0]).unwrap();
    assert!(view.is_mapped());
    assert_eq!(view.pos(), Point::from((0, 570)));
    assert_eq!(
        output.available_geometry(),
        Rectangle::new(Point::from((0, 0)), Size::from((800, 570)))
    );
    assert_eq!(f.shell.scene().views_of_surface(surface).count(), 1);
}

#[test]
fn windows_are_placed_inside_the_panel_free_area() {
    let mut f = fixture();
    let surface = f.shell.create_surface(f.desktop).unwrap();
    f.shell.set_panel(PanelId::new(1), f.output, surface, 0).unwrap();
    commit(&mut f.shell, surface, 800, 40);

    let (_, window) = map_toplevel(&mut f.shell, 200, 100);
    f.shell.set_maximized(window).unwrap();
    let events = f.shell.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        ShellEvent::Configure { shell_surface, size, .. }
            if *shell_surface == window && *size == Size::from((800, 560))
    )));
}

#[test]
fn only_the_current_load_serial_counts_and_only_once() {
    let mut f = fixture();
    f.shell.bind(f.desktop).unwrap();
    let stale = f.shell.output_bound(f.output).unwrap();
    let current = f.shell.output_bound(f.output).unwrap();
    assert_ne!(stale, current);
    f.shell.drain_events();

    f.shell.output_loaded(0);
    f.shell.output_loaded(stale);
    assert!(!f.shell.desktop().is_loaded());

    f.shell.output_loaded(current);
    f.shell.output_loaded(current);
    let events = f.shell.drain_events();
    assert_eq!(count(&events, |e| *e == ShellEvent::Loaded), 1);
    assert!(f.shell.desktop().is_loaded());
}

#[test]
fn output_bound_announces_the_output() {
    let mut f = fixture();
    f.shell.bind(f.desktop).unwrap();
    f.shell.drain_events();

    let serial = f.shell.output_bound(f.output).unwrap();
    let events = f.shell.drain_events();
    assert_eq!(
        events[0],
        ShellEvent::OutputLoad {
            output: f.output,
            name: "A".to_owned(),
            serial,
        }
    );
    assert!(matches!(events[1], ShellEvent::WorkspaceActivated { output, .. } if output == f.output));
}

#[test]
fn desktop_popup_honours_the_grace_period() {
    let mut f = fixture();
    let panel_surface = f.shell.create_surface(f.desktop).unwrap();
    f.shell
        .set_panel(PanelId::new(1), f.output, panel_surface, 0)
        .unwrap();
    commit(&mut f.shell, panel_surface, 800, 30);

    f.shell.pointer_motion(f.seat, 990, Point::from((5.0, 5.0)));
    f.shell.pointer_button(f.seat, 1000, BTN_LEFT, ButtonState::Pressed);
    f.shell.pointer_button(f.seat, 1010, BTN_LEFT, ButtonState::Released);

    let popup = PopupId::new(3);
    let popup_surface = f.shell.create_surface(f.desktop).unwrap();
    f.shell
        .set_desktop_popup(popup, panel_surface, popup_surface, 10, 30)
        .unwrap();
    commit(&mut f.shell, popup_surface, 100, 200);
    f.shell.drain_events();

    f.shell.pointer_motion(f.seat, 1100, Point::from((400.0, 400.0)));
    f.shell.pointer_button(f.seat, 1400, BTN_LEFT, ButtonState::Pressed);
    f.shell.pointer_button(f.seat, 1410, BTN_LEFT, ButtonState::Released);
    assert!(!f.shell.drain_events().contains(&ShellEvent::PopupClose(popup)));

    f.shell.pointer_button(f.seat, 1500, BTN_LEFT, ButtonState::Pressed);
    assert!(f.shell.drain_events().contains(&ShellEvent::PopupClose(popup)));
    assert_eq!(f.shell.grab_kind(f.seat), None);
}

#[test]
fn desktop_popup_is_kept_on_screen() {
    let mut f = fixture();
    let panel_surface = f.shell.create_surface(f.desktop).unwrap();
    f.shell
        .set_panel(PanelId::new(1), f.output, panel_surface, 2)
        .unwrap();
    commit(&mut f.shell, panel_surface, 800, 30);

    let popup = PopupId::new(1);
    let popup_surface = f.shell.create_surface(f.desktop).unwrap();
    f.shell
        .set_desktop_popup(popup, panel_surface, popup_surface, 750, 30)
        .unwrap();
    commit(&mut f.shell, popup_surface, 100, 200);

    let view = f.shell.desktop().popup(popup).unwrap().views[0];
    assert_eq!(f.shell.scene().global_pos(view), Point::from((700, 400)));

    f.shell.destroy_surface(panel_surface).unwrap();
    assert!(f.shell.desktop().popup(popup).unwrap().views.is_empty());
    assert!(f.shell.scene().view(view).is_none());
}

#[test]
fn lock_screen_owns_the_keyboard() {
    let mut f = fixture();
    let lock_surface = f.shell.create_surface(f.desktop).unwrap();
    f.shell.set_lock_surface(lock_surface, f.output).unwrap();
    commit(&mut f.shell, lock_surface, 800, 600);
    let (window, _) = map_toplevel(&mut f.shell, 200, 100);
    let binding = BindingId::new(1);
    f.shell
        .add_key_binding(binding, Keysym::a.raw(), KeyModifiers::SUPER.bits());
    assert_eq!(f.shell.seat(f.seat).unwrap().keyboard.focus(), Some(window));

    f.shell.lock();
    assert!(f.shell.is_locked());
    assert_eq!(
        f.shell.seat(f.seat).unwrap().keyboard.focus(),
        Some(lock_surface)
    );

    f.shell.pointer_motion(f.seat, 0, Point::from((50.0, 50.0)));
    f.shell.pointer_button(f.seat, 1, BTN_LEFT, ButtonState::Pressed);
    assert_eq!(
        f.shell.seat(f.seat).unwrap().keyboard.focus(),
        Some(lock_surface)
    );

    let mut logo = ModifiersState::default();
    logo.logo = true;
    f.shell.keyboard_modifiers(f.seat, logo);
    f.shell.drain_events();
    f.shell.keyboard_key(f.seat, 2, Keysym::a, KeyState::Pressed);
    let events = f.shell.drain_events();
    assert!(!events.contains(&ShellEvent::BindingTriggered(binding)));
    assert!(events.iter().any(|e| matches!(
        e,
        ShellEvent::Key { surface, .. } if *surface == lock_surface
    )));

    f.shell.unlock();
    assert!(f.shell.drain_events().contains(&ShellEvent::Unlocked));
    assert_eq!(f.shell.seat(f.seat).unwrap().keyboard.focus(), None);
    f.shell.keyboard_key(f.seat, 3, Keysym::a, KeyState::Pressed);
    assert_eq!(
        f.shell.drain_events(),
        vec![ShellEvent::BindingTriggered(binding)]
    );
}

#[test]
fn quit_binding_still_works_while_locked() {
    let mut f = fixture();
    f.shell.lock();
    let mut mods = ModifiersState::default();
    mods.logo = true;
    mods.shift = true;
    f.shell.keyboard_modifiers(f.seat, mods);
    f.shell.keyboard_key(f.seat, 0, Keysym::Escape, KeyState::Pressed);
    assert!(!f.shell.is_running());
}

#[test]
fn companion_exit_releases_its_state() {
    let mut f = fixture();
    f.shell.bind(f.desktop).unwrap();
    let panel_surface = f.shell.create_surface(f.desktop).unwrap();
    f.shell
        .set_panel(PanelId::new(1), f.output, panel_surface, 0)
        .unwrap();
    commit(&mut f.shell, panel_surface, 800, 30);
    f.shell.create_grab(crate::ids::ClientGrabId::new(1)).unwrap();

    f.shell.destroy_client(f.desktop);
    assert!(!f.shell.desktop().is_bound());
    assert_eq!(f.shell.grab_kind(f.seat), None);
    assert!(f.shell.panel(PanelId::new(1)).is_none());
    assert_eq!(
        f.shell.output(f.output).unwrap().available_geometry(),
        f.shell.output(f.output).unwrap().geometry()
    );
    assert!(
        !f.shell
            .drain_events()
            .iter()
            .any(|e| matches!(e, ShellEvent::GrabEnded(_)))
    );
}
