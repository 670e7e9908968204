use proptest::prelude::*;
use tm_core::charset::glyph;
use tm_core::mocks::{Action, RecordingRenderer, ScriptedInput, ScriptedShell};
use tm_core::selection::{char_window, wrap_index, CharView};
use tm_core::supplicant::render_config;
use tm_core::{CharSet, Device, WifiCredential};
use tm_traits::Signal;

fn enter(script: Vec<Action>) -> String {
    let input = ScriptedInput::new(script);
    let mut dev = Device::builder()
        .with_clock(input.clock())
        .with_input(input)
        .with_screen(RecordingRenderer::new())
        .with_shell(ScriptedShell::new())
        .build()
        .unwrap();
    dev.ui
        .select_chars("Passkey", "So Far", &CharSet::printable())
        .unwrap()
}

proptest! {
    #[test]
    fn wrapped_index_is_in_range(steps in any::<i32>(), len in 1usize..200) {
        prop_assert!(wrap_index(steps, len) < len);
    }

    #[test]
    fn one_detent_moves_one_row(steps in -20_000i32..20_000, len in 1usize..50) {
        prop_assert_eq!(wrap_index(steps + 1, len), (wrap_index(steps, len) + 1) % len);
    }

    #[test]
    fn cursor_character_is_under_the_knob(cursor in 0i32..100, window in 1usize..20) {
        let set = CharSet::printable();
        match char_window(&set, cursor, window) {
            CharView::At { cursor: shown, .. } => {
                let c = set.get(usize::try_from(cursor).unwrap()).unwrap();
                prop_assert_eq!(shown, glyph(c).into_owned());
            }
            CharView::Delete { .. } => prop_assert!(false, "non-negative cursor drew DEL"),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn delete_undoes_the_last_character(text in "[ -~]{0,12}", extra in "[a-zA-Z0-9]") {
        let set = CharSet::printable();
        let mut script = Action::typing(&set, &text);
        script.extend(Action::typing(&set, &extra));
        script.extend([
            Action::Steps(-1),
            Action::Press(Signal::Select),
            Action::Press(Signal::Stop),
        ]);
        prop_assert_eq!(enter(script), text);
    }

    #[test]
    fn rendering_is_deterministic(
        ssid in "[a-zA-Z0-9 _-]{1,32}",
        passkey in "[ -~]{0,63}",
        country in "[A-Z]{2}",
    ) {
        let cred = WifiCredential::new(ssid.clone(), passkey, country);
        let a = render_config(&cred).unwrap();
        let b = render_config(&cred.clone()).unwrap();
        prop_assert_eq!(&a, &b);
        let ssid_line = format!("        ssid=\"{ssid}\"\n");
        prop_assert!(a.contains(&ssid_line));
        prop_assert!(a.ends_with("}\n"), "network block is not closed");
    }
}
