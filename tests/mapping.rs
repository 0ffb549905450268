mod tests {
    use moonmap::error::CapacityKind;
    use moonmap::modifier::{CheckerboardModifier, MirrorModifier};
    use moonmap::{
        BufferReadiness, Coord3D, FrameSnapshot, FrontBuffer, LayoutError, LayoutKind,
        LayoutRequests, LayoutSink, LayoutSlot, LightPreset, LightSource, ModifierSlot,
        PhysMapEntry, PhysicalLayer, PhysicalLayerConfig, Rgb, StripLayout, VirtualLayer,
    };

    fn strip_layer<'a>(
        requests: &'a LayoutRequests,
        front: &'a FrontBuffer,
        lights: u16,
    ) -> PhysicalLayer<'a> {
        strip_layer_with(requests, front, lights, &PhysicalLayerConfig::default())
    }

    fn strip_layer_with<'a>(
        requests: &'a LayoutRequests,
        front: &'a FrontBuffer,
        lights: u16,
        config: &PhysicalLayerConfig,
    ) -> PhysicalLayer<'a> {
        let mut layer = PhysicalLayer::new(config, requests, front);
        layer
            .add_source(LayoutSlot::Strip(StripLayout::new(lights)))
            .unwrap();
        layer.add_layer(VirtualLayer::new()).unwrap();
        layer
    }

    fn light(layer: &PhysicalLayer<'_>, index: usize) -> Vec<u8> {
        let stride = layer.lights().stride();
        layer.lights().channels()[index * stride..(index + 1) * stride].to_vec()
    }

    #[test]
    fn test_one_to_one_strip() {
        let requests = LayoutRequests::new();
        let front = FrontBuffer::new();
        let mut layer = strip_layer(&requests, &front, 10);

        let report = layer.run_pending_layout();
        assert!(report.physical);
        assert!(report.virtual_pass);
        assert_eq!(report.lights, 10);
        assert!(report.is_clean());

        let virtual_layer = layer.layer(0).unwrap();
        assert_eq!(virtual_layer.size(), Coord3D::new(10, 1, 1));
        assert_eq!(virtual_layer.geometry().dimension, 1);
        let entries: Vec<_> = virtual_layer.table().entries().collect();
        let expected: Vec<_> = (0..10).map(PhysMapEntry::OnePhysical).collect();
        assert_eq!(entries, expected);
    }

    #[test]
    fn test_mirror_shares_slots() {
        let requests = LayoutRequests::new();
        let front = FrontBuffer::new();
        let mut layer = strip_layer(&requests, &front, 8);
        layer
            .attach_modifier(0, ModifierSlot::Mirror(MirrorModifier::default()))
            .unwrap();
        layer.run_pending_layout();

        let virtual_layer = layer.layer(0).unwrap();
        assert_eq!(virtual_layer.size(), Coord3D::new(4, 1, 1));
        assert_eq!(virtual_layer.table().len(), 4);

        for index in 0..4u16 {
            let Some(PhysMapEntry::ManyPhysical(group)) = virtual_layer.table().get(index.into())
            else {
                panic!("slot {index} is not shared");
            };
            let mut members = virtual_layer.pool().members(group).to_vec();
            members.sort_unstable();
            assert_eq!(members, vec![index, 7 - index]);
        }

        let stats = virtual_layer.stats();
        assert_eq!(stats.many_slots, 4);
        assert_eq!(stats.many_lights, 8);
        assert_eq!(stats.zero, 0);
    }

    #[test]
    fn test_checkerboard_blanks_suppressed_lights() {
        let requests = LayoutRequests::new();
        let front = FrontBuffer::new();
        let mut layer = strip_layer(&requests, &front, 8);
        let checkerboard = CheckerboardModifier::new(Coord3D::ONE, false, false);
        layer
            .attach_modifier(0, ModifierSlot::Checkerboard(checkerboard))
            .unwrap();
        layer.run_pending_layout();

        let virtual_layer = layer.layer(0).unwrap();
        assert_eq!(virtual_layer.stats().suppressed, 4);
        assert_eq!(virtual_layer.table().len(), 8);
        for index in 0..8u16 {
            let entry = virtual_layer.table().get(index.into()).unwrap();
            if index % 2 == 0 {
                assert_eq!(entry, PhysMapEntry::OnePhysical(index));
            } else {
                assert!(!entry.is_mapped(), "slot {index}");
            }
        }

        // discovery leaves the working buffer black
        assert!(layer.lights().channels()[..24].iter().all(|&byte| byte == 0));

        layer.gate().acknowledge();
        layer.lights_mut().channels_mut().fill(9);
        layer.request_layout(LayoutKind::Virtual);
        layer.run_pending_layout();
        assert_eq!(light(&layer, 2), vec![9, 9, 9]);
        assert_eq!(light(&layer, 3), vec![0, 0, 0]);
        assert_eq!(light(&layer, 7), vec![0, 0, 0]);
    }

    #[test]
    fn test_virtual_pass_keeps_physical_state() {
        let requests = LayoutRequests::new();
        let front = FrontBuffer::new();
        let mut layer = strip_layer(&requests, &front, 6);
        layer.run_pending_layout();
        layer.gate().acknowledge();

        let size = layer.size();
        let pins = layer.pins().to_vec();
        layer.lights_mut().channels_mut()[3] = 42;

        layer.request_layout(LayoutKind::Virtual);
        let report = layer.run_pending_layout();
        assert!(!report.physical);
        assert!(report.virtual_pass);
        assert_eq!(report.lights, 6);

        assert_eq!(layer.size(), size);
        assert_eq!(layer.pins(), pins.as_slice());
        assert_eq!(layer.readiness(), BufferReadiness::Ready);
        assert_eq!(layer.lights().channels()[3], 42);
    }

    #[test]
    fn test_virtual_relayout_is_idempotent() {
        let requests = LayoutRequests::new();
        let front = FrontBuffer::new();
        let mut layer = strip_layer(&requests, &front, 9);
        layer
            .attach_modifier(0, ModifierSlot::Mirror(MirrorModifier::default()))
            .unwrap();
        layer.run_pending_layout();

        let snapshot = |layer: &PhysicalLayer<'_>| {
            let virtual_layer = layer.layer(0).unwrap();
            let packed = virtual_layer.table().packed().to_vec();
            let groups: Vec<Vec<u16>> = (0..virtual_layer.pool().len())
                .map(|group| virtual_layer.pool().members(group as u16).to_vec())
                .collect();
            (packed, groups)
        };
        let first = snapshot(&layer);

        layer.request_layout(LayoutKind::Virtual);
        layer.run_pending_layout();
        assert_eq!(snapshot(&layer), first);
    }

    #[test]
    fn test_virtual_pass_sees_new_bounding_box() {
        let requests = LayoutRequests::new();
        let front = FrontBuffer::new();
        let mut layer = strip_layer(&requests, &front, 4);
        layer.run_pending_layout();
        assert_eq!(layer.layer(0).unwrap().size(), Coord3D::new(4, 1, 1));

        layer.update_source(0, |source| {
            if let LayoutSlot::Strip(strip) = source {
                strip.lights = 12;
            }
        });
        let report = layer.run_pending_layout();
        assert!(report.physical && report.virtual_pass);
        assert_eq!(layer.size(), Coord3D::new(12, 1, 1));
        assert_eq!(layer.layer(0).unwrap().size(), Coord3D::new(12, 1, 1));
        assert_eq!(layer.layer(0).unwrap().table().len(), 12);
    }

    #[test]
    fn test_readiness_after_discovery() {
        let requests = LayoutRequests::new();
        let front = FrontBuffer::new();
        let mut layer = strip_layer(&requests, &front, 3);
        assert_eq!(layer.readiness(), BufferReadiness::Ready);
        layer.run_pending_layout();
        assert_eq!(layer.readiness(), BufferReadiness::PositionsReady);

        let empty_front = FrontBuffer::new();
        let mut empty =
            PhysicalLayer::new(&PhysicalLayerConfig::default(), &requests, &empty_front);
        empty.request_layout(LayoutKind::Physical);
        let report = empty.run_pending_layout();
        assert_eq!(report.lights, 0);
        assert_eq!(empty.readiness(), BufferReadiness::PositionsEmpty);
        assert_eq!(empty.size(), Coord3D::ZERO);
        assert!(empty.canvas(0).is_none());
    }

    #[test]
    fn test_effects_wait_for_the_positions_handshake() {
        let requests = LayoutRequests::new();
        let front = FrontBuffer::new();
        let mut layer = strip_layer(&requests, &front, 3);
        layer.run_pending_layout();
        assert!(layer.canvas(0).is_none());

        layer.gate().acknowledge();
        layer.canvas(0).unwrap().fill_rgb(Rgb::new(1, 1, 1));
        assert_eq!(light(&layer, 2), vec![1, 1, 1]);

        layer.gate().transition(BufferReadiness::InProgress);
        assert!(layer.canvas(0).is_none());
        layer.gate().transition(BufferReadiness::PositionsEmpty);
        assert!(layer.canvas(0).is_some());
    }

    #[test]
    fn test_requests_from_other_tasks_coalesce() {
        let requests = LayoutRequests::new();
        let front = FrontBuffer::new();
        let mut layer = strip_layer(&requests, &front, 3);
        layer.run_pending_layout();
        assert!(layer.run_pending_layout().is_idle());

        let requester = requests.requester();
        requester.request(LayoutKind::Virtual);
        requester.request(LayoutKind::Virtual);
        assert!(layer.pending().virtual_pass);

        let report = layer.run_pending_layout();
        assert!(!report.physical);
        assert!(report.virtual_pass);
        assert!(layer.run_pending_layout().is_idle());
    }

    #[test]
    fn test_light_ceiling_clamps_both_passes() {
        let requests = LayoutRequests::new();
        let config = PhysicalLayerConfig {
            light_ceiling: 5,
            ..PhysicalLayerConfig::default()
        };
        let front = FrontBuffer::new();
        let mut layer = strip_layer_with(&requests, &front, 8, &config);
        let report = layer.run_pending_layout();

        assert_eq!(report.lights, 5);
        assert_eq!(
            report.warnings(),
            &[LayoutError::CapacityExceeded {
                kind: CapacityKind::LightCeiling,
                index: 5,
            }]
        );
        assert_eq!(layer.size(), Coord3D::new(5, 1, 1));
        let virtual_layer = layer.layer(0).unwrap();
        assert_eq!(virtual_layer.table().len(), 5);
        assert_eq!(virtual_layer.stats().one, 5);
    }

    #[test]
    fn test_buffer_size_limits_lights() {
        let requests = LayoutRequests::new();
        let config = PhysicalLayerConfig {
            max_channels: 12,
            ..PhysicalLayerConfig::default()
        };
        let front = FrontBuffer::new();
        let mut layer = strip_layer_with(&requests, &front, 10, &config);
        let report = layer.run_pending_layout();
        assert_eq!(report.lights, 4);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_calls_outside_a_pass_are_reported() {
        let requests = LayoutRequests::new();
        let front = FrontBuffer::new();
        let mut layer = strip_layer(&requests, &front, 2);
        layer.add_physical_light(Coord3D::ZERO);
        layer.advance_pin(None);

        let report = layer.run_pending_layout();
        assert_eq!(
            report.warnings(),
            &[LayoutError::InvalidPass, LayoutError::InvalidPass]
        );
        assert_eq!(report.lights, 2);
    }

    #[test]
    fn test_preset_change_rediscovers_lights() {
        let requests = LayoutRequests::new();
        let front = FrontBuffer::new();
        let mut layer = strip_layer(&requests, &front, 4);
        layer.run_pending_layout();

        layer.set_light_preset(LightPreset::Rgbw);
        assert!(layer.pending().physical);
        layer.run_pending_layout();
        assert_eq!(layer.lights().stride(), 4);
        assert_eq!(layer.lights().nr_of_channels(), 16);
        assert_eq!(light(&layer, 3), vec![0, 0, 0, 0]);

        let mut frame = FrameSnapshot::new();
        front.consume(&mut frame);
        assert_eq!(frame.channels().len(), 12);
        assert_eq!(&frame.channels()[9..], &[3, 0, 0]);
        assert_eq!(frame.as_frame().layout.stride(), 4);
    }

    #[test]
    fn test_size_changes_are_reported_once() {
        let requests = LayoutRequests::new();
        let front = FrontBuffer::new();
        let mut layer = strip_layer(&requests, &front, 5);
        layer.run_pending_layout();
        assert_eq!(layer.take_size_change(), Some(Coord3D::ZERO));
        assert_eq!(layer.take_size_change(), None);

        let virtual_layer = layer.layer_mut(0).unwrap();
        assert_eq!(virtual_layer.take_size_change(), Some(Coord3D::ZERO));
        assert_eq!(virtual_layer.take_size_change(), None);

        layer.request_layout(LayoutKind::Physical);
        layer.run_pending_layout();
        assert_eq!(layer.take_size_change(), None);
    }

    #[test]
    fn test_rgb_write_reaches_every_shared_light() {
        let requests = LayoutRequests::new();
        let front = FrontBuffer::new();
        let mut layer = strip_layer(&requests, &front, 8);
        layer
            .attach_modifier(0, ModifierSlot::Mirror(MirrorModifier::default()))
            .unwrap();
        layer.run_pending_layout();
        layer.gate().acknowledge();

        let color = Rgb::new(10, 20, 30);
        let mut canvas = layer.canvas(0).unwrap();
        canvas.set_rgb(Coord3D::line(1), color);
        assert_eq!(canvas.get_rgb(Coord3D::line(1)), color);

        assert_eq!(light(&layer, 1), vec![10, 20, 30]);
        assert_eq!(light(&layer, 6), light(&layer, 1));
    }

    #[test]
    fn test_fill_covers_all_lights() {
        let requests = LayoutRequests::new();
        let front = FrontBuffer::new();
        let mut layer = strip_layer(&requests, &front, 6);
        layer
            .attach_modifier(0, ModifierSlot::Mirror(MirrorModifier::default()))
            .unwrap();
        layer.run_pending_layout();
        layer.gate().acknowledge();

        layer.canvas(0).unwrap().fill_rgb(Rgb::new(1, 2, 3));
        for index in 0..6 {
            assert_eq!(light(&layer, index), vec![1, 2, 3]);
        }

        layer.canvas(0).unwrap().fade_to_black_by(u8::MAX);
        assert!(layer.lights().channels()[..18].iter().all(|&byte| byte == 0));
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
    fn test_lights_the_table_cannot_hold_are_blanked() {
        let requests = LayoutRequests::new();
        let front = FrontBuffer::new();
        let mut layer = PhysicalLayer::new(&PhysicalLayerConfig::default(), &requests, &front);
        layer
            .add_source(LayoutSlot::Custom(Box::new(Points(vec![
                Coord3D::ZERO,
                Coord3D::xy(300, 300),
            ]))))
            .unwrap();
        layer.add_layer(VirtualLayer::new()).unwrap();
        layer.run_pending_layout();
        layer.gate().acknowledge();

        layer.lights_mut().channels_mut().fill(9);
        layer.request_layout(LayoutKind::Virtual);
        let report = layer.run_pending_layout();

        assert!(report.warnings().contains(&LayoutError::CapacityExceeded {
            kind: CapacityKind::VirtualIndex,
            index: 300 + 300 * 301,
        }));
        let virtual_layer = layer.layer(0).unwrap();
        assert_eq!(virtual_layer.nr_of_lights(), 301 * 301);
        assert_eq!(virtual_layer.stats().unmapped, 1);
        assert_eq!(virtual_layer.stats().one, 1);
        assert_eq!(light(&layer, 0), vec![9, 9, 9]);
        assert_eq!(light(&layer, 1), vec![0, 0, 0]);

        // in-layer indices past the table do not reach physical lights
        let mut canvas = layer.canvas(0).unwrap();
        canvas.set_rgb(Coord3D::line(1), Rgb::new(5, 5, 5));
        assert_eq!(canvas.get_rgb(Coord3D::line(1)), Rgb::default());
        canvas.set_rgb(Coord3D::ZERO, Rgb::new(7, 7, 7));
        assert_eq!(light(&layer, 0), vec![7, 7, 7]);
        assert_eq!(light(&layer, 1), vec![0, 0, 0]);
    }
}
