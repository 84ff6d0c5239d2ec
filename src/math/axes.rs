//! Conversion from the host's right-handed, Z-up space into the left-handed
//! convention the `.scene` and `.ply` consumers expect.

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3, Vec4};

/// Splits an affine matrix into scale, rotation and translation.
///
/// Scale factors are the basis vector lengths. A mirrored basis (negative determinant)
/// negates all three of them and leaves the rest to the rotation, which is how the
/// authoring tool decomposes its matrices.
pub fn decompose(matrix: &Mat4) -> (Vec3, Quat, Vec3) {
    let basis = Mat3::from_mat4(*matrix);
    let mut scale = Vec3::new(
        basis.x_axis.length(),
        basis.y_axis.length(),
        basis.z_axis.length(),
    );
    if basis.determinant() < 0.0 {
        scale = -scale;
    }

    let rotation = if scale.cmpeq(Vec3::ZERO).any() {
        Quat::IDENTITY
    } else {
        Quat::from_mat3(&Mat3::from_cols(
            basis.x_axis / scale.x,
            basis.y_axis / scale.y,
            basis.z_axis / scale.z,
        ))
    };

    (scale, rotation, matrix.w_axis.truncate())
}

/// `(x, y, z)` becomes `(x, -z, y)`.
pub fn convert_position(position: Vec3) -> Vec3 {
    Vec3::new(position.x, -position.z, position.y)
}

/// Scale is an unsigned extent per axis, so only the permutation applies.
pub fn convert_scale(scale: Vec3) -> Vec3 {
    Vec3::new(scale.x, scale.z, scale.y)
}

/// Returns the rotation as the `(x, y, z, w)` quadruple written to the scene file.
///
/// The host rotation is split into XYZ Euler angles (X applied first), the X and Y
/// angles are negated to flip handedness, and the rebuilt quaternion is written with
/// its Y and Z components swapped and W negated.
pub fn convert_rotation(rotation: Quat) -> Vec4 {
    // Host "XYZ" order is extrinsic, which is glam's intrinsic ZYX.
    let (z, y, x) = rotation.normalize().to_euler(EulerRot::ZYX);
    let flipped = Quat::from_euler(EulerRot::ZYX, z, -y, -x);

    Vec4::new(flipped.x, flipped.z, flipped.y, -flipped.w)
}

/// glTF is Y-up while the host works Z-up. Positions and directions coming out of a
/// glTF document are rotated 90 degrees about X to land in host space.
pub fn position_from_gltf(position: Vec3) -> Vec3 {
    Vec3::new(position.x, -position.z, position.y)
}

pub fn rotation_from_gltf(rotation: Quat) -> Quat {
    Quat::from_xyzw(rotation.x, -rotation.z, rotation.y, rotation.w)
}

pub fn scale_from_gltf(scale: Vec3) -> Vec3 {
    Vec3::new(scale.x, scale.z, scale.y)
}
