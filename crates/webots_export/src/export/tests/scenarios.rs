//! End-to-end scenarios: sharing, materials, overrides, derived geometry

use super::{assert_well_formed, count, cube_mesh, export, export_with};
use crate::export::{ExportOptions, OverrideTable};
use crate::foundation::math::{Mat4, Vec2, Vec3};
use crate::scene::{
    Face, FaceUv, Image, Material, Mesh, Modifier, ObjectKind, Polygon, Scene, SceneObject, UvLayer, World,
};

fn translation(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::new_translation(&Vec3::new(x, y, z))
}

fn quad_mesh(name: &str) -> Mesh {
    let mut mesh = Mesh::new(name);
    mesh.vertices = vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    ];
    mesh.faces = vec![Face::new(Polygon::Quad([0, 1, 2, 3]))];
    mesh
}

#[test]
fn test_shared_mesh_is_written_once() {
    let mut scene = Scene::new();
    let mesh = scene.add_mesh(cube_mesh("Cube"));
    scene.add_object(SceneObject::mesh("Left", mesh).with_matrix_world(translation(-2.0, 0.0, 0.0)));
    scene.add_object(SceneObject::mesh("Right", mesh).with_matrix_world(translation(2.0, 0.0, 0.0)));

    let (text, stats) = export_with(&mut scene, ExportOptions::default(), &OverrideTable::new());

    assert_well_formed(&text);
    assert_eq!(count(&text, "DEF GROUP_ME_CUBE Group {"), 1);
    assert_eq!(count(&text, "USE GROUP_ME_CUBE"), 1);
    assert_eq!(count(&text, "Coordinate {"), 1);
    assert_eq!(count(&text, "USE "), 1);
    assert_eq!(stats.meshes, 1);
}

#[test]
fn test_cube_with_solid_override() {
    let mut scene = Scene::new();
    let material = scene.add_material(Material::new("Paint").with_diffuse(Vec3::new(0.2, 0.4, 0.6)));
    let mut cube = cube_mesh("Cube");
    cube.materials = vec![Some(material)];
    let mesh = scene.add_mesh(cube);
    scene.add_object(SceneObject::mesh("Cube", mesh));

    let overrides =
        OverrideTable::from_json_str(r#"{ "CUBE_TRANSFORM": { "webotsType": "Solid", "boundingObject": false } }"#)
            .unwrap();
    let (text, _) = export_with(&mut scene, ExportOptions::default(), &overrides);

    assert_well_formed(&text);
    assert_eq!(count(&text, "DEF CUBE_TRANSFORM Solid {"), 1);
    assert_eq!(count(&text, "physics Physics {"), 1);
    assert!(!text.contains("boundingObject"));
    assert_eq!(count(&text, "Shape {"), 1);
    assert!(text.contains("baseColor 0.200 0.400 0.600"));
    // Identity object: the override keeps the node, the face set has none
    assert!(text.contains("translation 0.000000 0.000000 0.000000"));
    assert!(!text.contains("CUBE_IFS_TRANSFORM"));
    assert_eq!(count(&text, "coordIndex ["), 1);
}

#[test]
fn test_solid_override_gets_bounding_box_by_default() {
    let mut scene = Scene::new();
    let mesh = scene.add_mesh(cube_mesh("Cube"));
    scene.add_object(SceneObject::mesh("Crate", mesh).with_matrix_world(Mat4::new_scaling(2.0)));

    let overrides = OverrideTable::from_json_str(r#"{ "CRATE_TRANSFORM": { "webotsType": "Solid" } }"#).unwrap();
    let (text, _) = export_with(&mut scene, ExportOptions::default(), &overrides);

    assert_well_formed(&text);
    assert!(text.contains("scale 2.000000 2.000000 2.000000"));
    assert!(text.contains("boundingObject Transform {\n    translation 0.000000 0.000000 0.000000\n"));
    // World-space size of the local box
    assert!(text.contains("size 4.000000 4.000000 4.000000"));
}

#[test]
fn test_robot_with_hinge_joint() {
    let mut scene = Scene::new();
    let mesh = scene.add_mesh(cube_mesh("Link"));
    let base = scene.add_object(SceneObject::mesh("Base", mesh));
    scene.add_object(
        SceneObject::mesh("Arm", mesh)
            .with_parent(base)
            .with_matrix_world(translation(0.0, 0.0, 1.5)),
    );

    let overrides = OverrideTable::from_json_str(
        r#"{
            "BASE_TRANSFORM": { "webotsType": "Robot" },
            "ARM_TRANSFORM": {
                "webotsType": "HingeJoint",
                "hingeJointParameters": { "axis": "0 1 0" },
                "motorName": "shoulder",
                "positionSensorName": "shoulder sensor"
            }
        }"#,
    )
    .unwrap();
    let (text, _) = export_with(&mut scene, ExportOptions::default(), &overrides);

    assert_well_formed(&text);
    assert!(text.starts_with("#VRML_SIM"));
    assert_eq!(count(&text, "DEF BASE_TRANSFORM Robot {"), 1);
    assert_eq!(count(&text, "DEF ARM_TRANSFORM HingeJoint {"), 1);
    // Only the joint's end point carries physics
    assert_eq!(count(&text, "physics Physics {"), 1);
    assert!(text.contains("anchor 0.000000 0.000000 1.500000"));
    assert!(text.contains("axis 0.000000 1.000000 0.000000"));
    assert!(text.contains("name \"shoulder\"\n"));
    assert!(text.contains("name \"shoulder sensor\"\n"));
    assert_eq!(count(&text, "endPoint Solid {"), 1);
    assert_eq!(count(&text, "USE GROUP_ME_LINK"), 1);
}

#[test]
fn test_output_is_deterministic() {
    let build = || {
        let mut scene = Scene::new();
        scene.set_world(World {
            ambient_color: Vec3::new(0.1, 0.1, 0.1),
        });
        let wood = scene.add_image(Image::new("wood", "//textures/wood.png"));
        let brick = scene.add_image(Image::new("brick", "//textures/brick.png"));
        let plain = scene.add_material(Material::new("Plain").with_image_texture(brick));
        let mut faced = Material::new("Faced").with_diffuse(Vec3::new(1.0, 0.5, 0.2));
        faced.use_face_texture = true;
        faced.emit = 0.5;
        let faced = scene.add_material(faced);

        let mut mesh = cube_mesh("Mixed");
        mesh.materials = vec![Some(plain), Some(faced)];
        for (i, face) in mesh.faces.iter_mut().enumerate() {
            face.material_index = i % 2;
            face.smooth = i == 0;
        }
        mesh.uv_layer = Some(UvLayer {
            faces: (0..6)
                .map(|i| FaceUv {
                    uvs: vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)],
                    image: [Some(brick), Some(wood), None][i % 3],
                })
                .collect(),
        });
        let mesh = scene.add_mesh(mesh);
        scene.add_object(SceneObject::mesh("Box", mesh).with_matrix_world(translation(0.0, 0.0, 0.5)));
        scene
    };

    let first = export(&mut build());
    let second = export(&mut build());

    assert_eq!(first, second);
    assert_well_formed(&first);
    // Slot 0 with its material image, slot 1 with no image, brick and wood
    assert_eq!(count(&first, "Shape {"), 4);
    assert_eq!(count(&first, "coord DEF COORDS_ME_MIXED Coordinate {"), 1);
    assert_eq!(count(&first, "coord USE COORDS_ME_MIXED"), 3);
    assert_eq!(count(&first, "texture DEF IM_BRICK ImageTexture {"), 1);
    assert_eq!(count(&first, "texture USE IM_BRICK"), 1);
    assert!(first.find("IM_BRICK").unwrap() < first.find("IM_WOOD").unwrap());
    assert_eq!(count(&first, "creaseAngle 1.0000"), 1);
    assert!(first.contains("emissiveColor 0.350 0.225 0.150"));
}

#[test]
fn test_material_texture_and_urls() {
    let mut scene = Scene::new();
    let steel = scene.add_image(Image::new("steel", "//textures/steel.png"));
    let material = scene.add_material(Material::new("Steel").with_image_texture(steel));
    let mut first = cube_mesh("Body");
    first.materials = vec![Some(material)];
    first.uv_layer = Some(UvLayer {
        faces: (0..6)
            .map(|_| FaceUv {
                uvs: vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)],
                image: None,
            })
            .collect(),
    });
    let mut second = quad_mesh("Lid");
    second.materials = vec![Some(material)];
    let first = scene.add_mesh(first);
    let second = scene.add_mesh(second);
    scene.add_object(SceneObject::mesh("Body", first));
    scene.add_object(SceneObject::mesh("Lid", second).with_matrix_world(translation(0.0, 0.0, 1.0)));

    let (text, stats) = export_with(&mut scene, ExportOptions::default(), &OverrideTable::new());

    assert_well_formed(&text);
    assert_eq!(count(&text, "texture DEF IM_STEEL ImageTexture {"), 1);
    assert_eq!(count(&text, "texture USE IM_STEEL"), 1);
    assert!(text.contains("url [ \"/scenes/textures/steel.png\" \"steel.png\" ]"));
    // The material ignores face textures, so the UV layer of "Body" is not written
    assert!(!text.contains("texCoord"));
    assert_eq!(stats.images, 1);
}

#[test]
fn test_face_uvs_are_written() {
    let mut scene = Scene::new();
    let image = scene.add_image(Image::new("decal", "/abs/decal.png"));
    let mut mesh = quad_mesh("Decal");
    mesh.uv_layer = Some(UvLayer {
        faces: vec![FaceUv {
            uvs: vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 0.5)],
            image: Some(image),
        }],
    });
    let mesh = scene.add_mesh(mesh);
    scene.add_object(SceneObject::mesh("Decal", mesh));

    let text = export(&mut scene);

    assert_well_formed(&text);
    assert!(text.contains("texCoordIndex [\n"));
    assert!(text.contains("0 1 2 3 -1 \n"));
    assert!(text.contains("texCoord TextureCoordinate {"));
    // The missing fourth corner is padded
    assert!(text.contains("0.0000 0.0000 1.0000 0.0000 1.0000 0.5000 0.0000 0.0000 \n"));
    assert!(text.contains("url [ \"/abs/decal.png\" \"decal.png\" ]"));
    // Empty slot: no colours
    assert!(!text.contains("baseColor"));
}

#[test]
fn test_curves_are_evaluated_and_released() {
    let mut scene = Scene::new();
    let tessellated = scene.add_mesh(quad_mesh("CurveData"));
    scene.add_object(
        SceneObject::new("Text.001", ObjectKind::Font)
            .with_data(tessellated)
            .with_matrix_world(translation(1.0, 0.0, 0.0)),
    );
    scene.add_object(
        SceneObject::new("Text.002", ObjectKind::Curve)
            .with_data(tessellated)
            .with_matrix_world(translation(2.0, 0.0, 0.0)),
    );
    scene.add_object(SceneObject::new("Empty Curve", ObjectKind::Curve).with_matrix_world(translation(3.0, 0.0, 0.0)));
    let meshes_before = scene.mesh_count();

    let (text, stats) = export_with(&mut scene, ExportOptions::default(), &OverrideTable::new());

    assert_well_formed(&text);
    assert_eq!(scene.mesh_count(), meshes_before);
    assert_eq!(stats.derived_meshes, 2);
    // Each evaluation is its own mesh
    assert_eq!(count(&text, "DEF GROUP_ME_TEXT"), 2);
    assert!(!text.contains("USE GROUP_"));
    assert!(text.contains("EMPTY_CURVE_TRANSFORM"));
}

#[test]
fn test_modifiers_apply_only_when_enabled() {
    let mut scene = Scene::new();
    let mesh = scene.add_mesh(quad_mesh("Plane"));
    scene.add_object(SceneObject::mesh("Plane", mesh).with_modifier(Modifier::Triangulate));

    let plain = export(&mut scene);
    assert!(plain.contains("0 1 2 3 -1 \n"));

    let options = ExportOptions {
        use_mesh_modifiers: true,
        ..ExportOptions::default()
    };
    let (evaluated, stats) = export_with(&mut scene, options, &OverrideTable::new());
    assert!(evaluated.contains("0 1 2 -1 0 2 3 -1 \n"));
    assert!(evaluated.contains("DEF GROUP_ME_PLANE Group {"));
    assert_eq!(stats.derived_meshes, 1);
    assert_eq!(scene.mesh_count(), 1);
}

#[test]
fn test_meshes_without_faces_write_no_shapes() {
    let mut scene = Scene::new();
    let mut points = Mesh::new("Points");
    points.vertices = vec![Vec3::zeros(), Vec3::x()];
    let mesh = scene.add_mesh(points);
    scene.add_object(SceneObject::mesh("Cloud", mesh).with_matrix_world(translation(0.0, 1.0, 0.0)));

    let text = export(&mut scene);

    assert_well_formed(&text);
    assert!(text.contains("DEF CLOUD_TRANSFORM Transform {"));
    assert!(!text.contains("GROUP_"));
    assert!(!text.contains("Shape"));
}
