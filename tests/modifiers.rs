mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use moonmap::channels::LightPreset;
    use moonmap::modifier::{
        CheckerboardModifier, CircleModifier, MirrorModifier, MultiplyModifier,
        PinwheelModifier, RippleYZModifier, RotateDirection, RotateModifier, TransposeModifier,
    };
    use moonmap::{
        Coord3D, FrontBuffer, Instant, LayerCanvas, LayerGeometry, LayoutReport, LayoutRequests, LayoutSink,
        LayoutSlot, LightSource, Lights, Modifier, ModifierId, ModifierSlot, PhysMapEntry,
        PhysicalLayer, PhysicalLayerConfig, Rgb, StripLayout, VirtualLayer,
    };

    fn laid_out(size: Coord3D, modifier: ModifierSlot) -> VirtualLayer {
        let mut layer = VirtualLayer::new();
        layer.add_modifier(modifier).unwrap();
        layer.on_layout_begin(size);
        layer
    }

    /// Map one physical light at `position` and return the slot it landed in
    fn mapped_index(layer: &mut VirtualLayer, position: Coord3D) -> Option<usize> {
        let mut lights = Lights::allocate(300, LightPreset::Rgb.layout());
        let mut report = LayoutReport::default();
        layer.add_light(position, 0, &mut lights, &mut report);
        assert!(report.is_clean());
        layer.table().entries().position(|entry| entry.is_mapped())
    }

    #[test]
    fn test_mirror_halves_selected_axes() {
        let mirror = MirrorModifier::new(true, true, false);
        let mut layer = laid_out(Coord3D::new(7, 6, 2), ModifierSlot::Mirror(mirror));
        assert_eq!(layer.size(), Coord3D::new(4, 3, 2));
        assert_eq!(layer.nr_of_lights(), 24);

        // (6, 5) folds onto (1, 0)
        assert_eq!(mapped_index(&mut layer, Coord3D::new(6, 5, 0)), Some(1));
    }

    #[test]
    fn test_transpose_swaps_axes() {
        let mut layer = laid_out(
            Coord3D::new(4, 2, 1),
            ModifierSlot::Transpose(TransposeModifier::default()),
        );
        assert_eq!(layer.size(), Coord3D::new(2, 4, 1));
        // (3, 1) becomes (1, 3)
        assert_eq!(mapped_index(&mut layer, Coord3D::new(3, 1, 0)), Some(7));
    }

    #[test]
    fn test_multiply_tiles_cells() {
        let multiply = MultiplyModifier::new(Coord3D::new(2, 2, 1), false);
        let mut layer = laid_out(Coord3D::new(8, 8, 1), ModifierSlot::Multiply(multiply));
        assert_eq!(layer.size(), Coord3D::new(4, 4, 1));
        assert_eq!(mapped_index(&mut layer, Coord3D::new(5, 6, 0)), Some(1 + 2 * 4));
    }

    #[test]
    fn test_multiply_mirrors_odd_cells() {
        let multiply = MultiplyModifier::new(Coord3D::new(2, 1, 1), true);
        let mut layer = laid_out(Coord3D::new(8, 1, 1), ModifierSlot::Multiply(multiply));
        assert_eq!(layer.size(), Coord3D::new(4, 1, 1));
        assert_eq!(mapped_index(&mut layer, Coord3D::line(5)), Some(2));
    }

    #[test]
    fn test_checkerboard_groups_squares() {
        let grouped = || {
            let checkerboard = CheckerboardModifier::new(Coord3D::new(2, 2, 1), false, true);
            laid_out(
                Coord3D::new(8, 8, 1),
                ModifierSlot::Checkerboard(checkerboard),
            )
        };

        let mut layer = grouped();
        assert_eq!(layer.size(), Coord3D::new(4, 4, 1));
        assert_eq!(mapped_index(&mut layer, Coord3D::new(3, 3, 0)), Some(1 + 4));
        assert_eq!(mapped_index(&mut grouped(), Coord3D::new(2, 0, 0)), None);
    }

    #[test]
    fn test_circle_projects_to_radius() {
        let mut layer = laid_out(
            Coord3D::new(8, 1, 1),
            ModifierSlot::Circle(CircleModifier::default()),
        );
        assert_eq!(layer.size(), Coord3D::new(5, 1, 1));
        assert_eq!(mapped_index(&mut layer, Coord3D::line(0)), Some(4));
    }

    #[test]
    fn test_pinwheel_sizes() {
        let strip = laid_out(
            Coord3D::new(10, 1, 1),
            ModifierSlot::Pinwheel(PinwheelModifier::new(12, 0, 1)),
        );
        assert_eq!(strip.size(), Coord3D::new(12, 1, 1));

        let mut panel = laid_out(
            Coord3D::new(8, 8, 1),
            ModifierSlot::Pinwheel(PinwheelModifier::new(4, 0, 1)),
        );
        assert_eq!(panel.size().x, 4);
        assert!(panel.size().y > 1);
        assert_eq!(panel.geometry().dimension, 2);
        assert!(mapped_index(&mut panel, Coord3D::new(1, 1, 0)).is_some());
    }

    #[test]
    fn test_rotate_turns_frames() {
        let mut rotate = RotateModifier::new(RotateDirection::Clockwise, 0);
        rotate.set_angle(180);
        let layer = laid_out(Coord3D::new(5, 5, 1), ModifierSlot::Rotate(rotate));

        assert!(layer.affects_rendering());
        assert_eq!(layer.resolved_index(Coord3D::ZERO), Some(24));
        assert_eq!(layer.resolved_index(Coord3D::xy(2, 2)), Some(12));
        assert_eq!(layer.linear_index(Coord3D::ZERO), 0);
    }

    #[test]
    fn test_rotate_drops_positions_far_outside() {
        for angle in [90, 180] {
            let mut rotate = RotateModifier::new(RotateDirection::Clockwise, 0);
            rotate.set_angle(angle);
            let layer = laid_out(Coord3D::new(5, 5, 1), ModifierSlot::Rotate(rotate));
            assert_eq!(layer.resolved_index(Coord3D::xy(i32::MIN, i32::MAX - 1)), None);
            assert_eq!(layer.resolved_index(Coord3D::xy(i32::MAX - 1, i32::MIN)), None);
        }
    }

    #[test]
    fn test_wide_layers_keep_their_radius() {
        let wide = Coord3D::new(60_000, 60_000, 1);

        let mut circle = laid_out(wide, ModifierSlot::Circle(CircleModifier::default()));
        assert_eq!(circle.size(), Coord3D::new(42_427, 1, 1));
        assert_eq!(mapped_index(&mut circle, Coord3D::ZERO), Some(42_426));

        let pinwheel = laid_out(wide, ModifierSlot::Pinwheel(PinwheelModifier::default()));
        assert_eq!(pinwheel.size(), Coord3D::new(60, 42_427, 1));
    }

    /// Lights at fixed positions
    struct Points(Vec<Coord3D>);

    impl LightSource for Points {
        fn on_layout(&mut self, sink: &mut dyn LayoutSink) {
            for &position in &self.0 {
                sink.add_light(position);
            }
        }
    }

    #[test]
    fn test_expanded_rotation_of_a_long_strip() {
        let requests = LayoutRequests::new();
        let front = FrontBuffer::new();
        let mut layer = PhysicalLayer::new(&PhysicalLayerConfig::default(), &requests, &front);
        let points = (0..4).map(|light| Coord3D::line(light * 20_000)).collect();
        layer
            .add_source(LayoutSlot::Custom(Box::new(Points(points))))
            .unwrap();
        layer.add_layer(VirtualLayer::new()).unwrap();
        let mut rotate = RotateModifier::new(RotateDirection::Clockwise, 0);
        rotate.expand = true;
        rotate.set_angle(45);
        layer
            .attach_modifier(0, ModifierSlot::Rotate(rotate))
            .unwrap();

        let report = layer.run_pending_layout();
        assert_eq!(report.lights, 4);
        assert!(!report.is_clean());
        let virtual_layer = layer.layer(0).unwrap();
        assert_eq!(virtual_layer.size(), Coord3D::new(84_855, 84_855, 1));
        assert_eq!(virtual_layer.stats().unmapped, 4);

        layer.gate().acknowledge();
        let mut canvas = layer.canvas(0).unwrap();
        canvas.set_rgb(Coord3D::xy(84_854, 0), Rgb::new(1, 2, 3));
        assert_eq!(canvas.get_rgb(Coord3D::xy(84_854, 0)), Rgb::default());
        assert!(layer.lights().channels().iter().all(|&byte| byte == 0));
    }

    #[test]
    fn test_rotate_static_angle_on_tick() {
        let mut rotate = RotateModifier::new(RotateDirection::Clockwise, 0);
        rotate.static_angle = 450;
        rotate.tick(Instant::from_millis(1234));
        assert_eq!(rotate.angle(), 90);
    }

    #[test]
    fn test_rotate_requests_physical_pass() {
        let requests = LayoutRequests::new();
        let front = FrontBuffer::new();
        let mut layer = PhysicalLayer::new(&PhysicalLayerConfig::default(), &requests, &front);
        layer
            .add_source(LayoutSlot::Strip(StripLayout::new(4)))
            .unwrap();
        layer.add_layer(VirtualLayer::new()).unwrap();
        layer.run_pending_layout();

        layer
            .attach_modifier(0, ModifierSlot::Mirror(MirrorModifier::default()))
            .unwrap();
        let pending = layer.pending();
        assert!(!pending.physical);
        assert!(pending.virtual_pass);
        layer.run_pending_layout();

        layer
            .attach_modifier(0, ModifierId::Rotate.to_slot())
            .unwrap();
        assert!(layer.pending().physical);
        layer.run_pending_layout();

        layer.update_modifier(0, 0, |modifier| {
            if let ModifierSlot::Mirror(mirror) = modifier {
                mirror.mirror_x = false;
            }
        });
        assert!(!layer.pending().physical);
        layer.run_pending_layout();
        assert_eq!(layer.layer(0).unwrap().size(), Coord3D::new(4, 1, 1));

        let removed = layer.detach_modifier(0, 1).unwrap();
        assert_eq!(removed.id(), Some(ModifierId::Rotate));
        assert!(layer.pending().physical);
        assert!(layer.detach_modifier(0, 5).is_none());
    }

    struct Counter {
        calls: Rc<Cell<usize>>,
    }

    impl Modifier for Counter {
        fn transform_placement(&mut self, _position: &mut Coord3D, _geometry: &LayerGeometry) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    #[test]
    fn test_suppression_stops_the_chain() {
        let calls = Rc::new(Cell::new(0));
        let mut layer = VirtualLayer::new();
        layer
            .add_modifier(ModifierSlot::Checkerboard(CheckerboardModifier::new(
                Coord3D::ONE,
                false,
                false,
            )))
            .unwrap();
        layer
            .add_modifier(ModifierSlot::Custom(Box::new(Counter {
                calls: Rc::clone(&calls),
            })))
            .unwrap();
        assert_eq!(layer.modifiers()[1].name(), "custom");
        assert_eq!(layer.modifiers()[1].id(), None);

        let mut lights = Lights::allocate(24, LightPreset::Rgb.layout());
        let mut report = LayoutReport::default();
        layer.on_layout_begin(Coord3D::new(8, 1, 1));
        for x in 0..8 {
            layer.add_light(Coord3D::line(x), x as usize, &mut lights, &mut report);
        }
        layer.on_layout_end(&mut report);

        assert_eq!(calls.get(), 4);
        assert_eq!(layer.stats().suppressed, 4);
        assert_eq!(layer.stats().one, 4);
        assert_eq!(layer.stats().zero, 4);
    }

    struct Shift;

    impl Modifier for Shift {
        fn transform_placement(&mut self, position: &mut Coord3D, _geometry: &LayerGeometry) {
            position.x += 1;
        }
    }

    #[test]
    fn test_lights_pushed_off_the_layer_are_blanked() {
        let mut layer = VirtualLayer::new();
        layer
            .add_modifier(ModifierSlot::Custom(Box::new(Shift)))
            .unwrap();

        let mut lights = Lights::allocate(12, LightPreset::Rgb.layout());
        lights.channels_mut().fill(7);
        let mut report = LayoutReport::default();
        layer.on_layout_begin(Coord3D::new(4, 1, 1));
        for x in 0..4 {
            layer.add_light(Coord3D::line(x), x as usize, &mut lights, &mut report);
        }
        layer.on_layout_end(&mut report);

        assert!(report.is_clean());
        assert_eq!(layer.stats().suppressed, 1);
        assert_eq!(layer.table().get(0), Some(PhysMapEntry::default()));
        assert_eq!(layer.table().get(3), Some(PhysMapEntry::OnePhysical(2)));
        assert_eq!(&lights.channels()[9..], &[0, 0, 0]);
        assert_eq!(&lights.channels()[..9], &[7; 9]);
    }

    #[test]
    fn test_ripple_shrinks_onto_the_first_row() {
        let ripple = RippleYZModifier::default();
        let mut layer = laid_out(Coord3D::new(4, 3, 1), ModifierSlot::RippleYZ(ripple));
        assert_eq!(layer.size(), Coord3D::new(4, 1, 1));
        assert_eq!(layer.geometry().dimension, 1);
        assert_eq!(mapped_index(&mut layer, Coord3D::new(2, 2, 0)), Some(2));
    }

    #[test]
    fn test_ripple_pushes_the_line_down() {
        let ripple = RippleYZModifier::new(false, true, false);
        let mut layer = laid_out(Coord3D::new(2, 3, 1), ModifierSlot::RippleYZ(ripple));
        assert_eq!(layer.size(), Coord3D::new(2, 3, 1));

        let mut lights = Lights::allocate(18, LightPreset::Rgb.layout());
        let mut report = LayoutReport::default();
        for physical in 0..6 {
            let position = Coord3D::xy((physical % 2) as i32, (physical / 2) as i32);
            layer.add_light(position, physical, &mut lights, &mut report);
        }
        layer.on_layout_end(&mut report);
        assert!(report.is_clean());

        let mut canvas = LayerCanvas::new(&mut layer, &mut lights);
        canvas.set_rgb(Coord3D::xy(0, 0), Rgb::new(1, 2, 3));
        canvas.set_rgb(Coord3D::xy(1, 0), Rgb::new(4, 5, 6));
        canvas.ripple(1);
        assert_eq!(canvas.get_rgb(Coord3D::xy(0, 1)), Rgb::new(1, 2, 3));
        assert_eq!(canvas.get_rgb(Coord3D::xy(1, 2)), Rgb::default());
        canvas.ripple(1);
        assert_eq!(canvas.get_rgb(Coord3D::xy(1, 2)), Rgb::new(4, 5, 6));

        // a two dimensional effect fills the layer itself
        canvas.set_rgb(Coord3D::xy(0, 0), Rgb::new(9, 9, 9));
        canvas.ripple(2);
        assert_eq!(canvas.get_rgb(Coord3D::xy(0, 1)), Rgb::new(1, 2, 3));
        assert_eq!(&lights.channels()[..6], &[9, 9, 9, 4, 5, 6]);
    }

    #[test]
    fn test_modifier_ids_round_trip() {
        for raw in 0..8 {
            let id = ModifierId::from_raw(raw).unwrap();
            assert_eq!(ModifierId::parse_from_str(id.as_str()), Some(id));
            assert_eq!(ModifierSlot::from(id).id(), Some(id));
        }
        assert_eq!(ModifierId::from_raw(8), None);
        assert_eq!(ModifierId::parse_from_str("spin"), None);
    }
}
